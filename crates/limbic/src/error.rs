//! # Errors
//!
//! Setup-time failures for the animation core.
//!
//! Everything here is raised while a character is being built, equipped or
//! configured. Per-tick pose generation never returns these: numeric trouble
//! inside a tick is clamped locally so one bad frame cannot stop the loop.

use crate::curves::CurveKey;
use crate::limb::LimbId;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, LimbicError>;

/// Animation core errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LimbicError {
    #[error("No such landmark: {0}")]
    UnknownLandmark(String),

    #[error("No such attack: {0}")]
    UnknownAttack(String),

    #[error("No such named rotation: {0}")]
    UnknownRotation(String),

    #[error("Missing curve: {0:?}")]
    MissingCurve(CurveKey),

    #[error("Curve {0:?} has no keyframes")]
    EmptyCurve(CurveKey),

    #[error("Curve {0:?} has non-finite or out-of-order keyframes")]
    MalformedCurve(CurveKey),

    #[error("Missing limb: {0}")]
    MissingLimb(LimbId),

    #[error("Unknown joint: {0}")]
    UnknownJoint(String),

    #[error("Joint '{joint}' names parent index {parent}, which does not precede it")]
    BadParent { joint: String, parent: usize },

    #[error("Malformed chain: '{root}' is not an ancestor of '{tip}'")]
    MalformedChain { root: String, tip: String },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<std::io::Error> for LimbicError {
    fn from(e: std::io::Error) -> Self {
        LimbicError::Io(e.to_string())
    }
}

impl From<ron::error::SpannedError> for LimbicError {
    fn from(e: ron::error::SpannedError) -> Self {
        LimbicError::Parse(e.to_string())
    }
}

impl From<ron::Error> for LimbicError {
    fn from(e: ron::Error) -> Self {
        LimbicError::Parse(e.to_string())
    }
}
