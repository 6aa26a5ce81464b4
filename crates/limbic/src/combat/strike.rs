//! # Strikes
//!
//! One discrete weapon motion: where each participating limb starts and ends,
//! and how long the wind-up, the swing and the recovery take.
//!
//! [`StrikeSpec`] is data (landmark names and rotation presets, written for a
//! right-handed strike). [`StrikeSpec::resolve`] turns it into a concrete
//! [`Strike`] for one character's limbs, mirroring it when the weapon hand is
//! the left one.

use serde::{Deserialize, Serialize};

use crate::error::{LimbicError, Result};
use crate::landmarks::{LandmarkKind, Landmarks};
use crate::limb::Side;
use crate::math::{look_rotation, BodyAxes, NamedRotation, Pose, Quat, Vec3};

const DEFAULT_PREP: f32 = 0.2;
const DEFAULT_DURATION: f32 = 0.08;

// ============================================================================
// Targets
// ============================================================================

/// How a strike pose is oriented
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Orientation {
    Named(NamedRotation),
    /// Face along a body-frame direction (authored for the right hand)
    LookAt(Vec3),
}

impl Orientation {
    /// Rotation for a limb on `side`
    pub fn resolve(&self, side: Side) -> Quat {
        match *self {
            Orientation::Named(NamedRotation::Up) => NamedRotation::up_for(side.is_left()).quat(),
            Orientation::Named(named) => named.quat(),
            Orientation::LookAt(direction) => {
                let mirrored = Vec3::new(direction.x * side.sign(), direction.y, direction.z);
                look_rotation(mirrored, BodyAxes::UP)
            }
        }
    }
}

/// Landmark plus orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub landmark: LandmarkKind,
    pub orientation: Orientation,
}

impl TargetSpec {
    pub const fn named(landmark: LandmarkKind, rotation: NamedRotation) -> Self {
        Self {
            landmark,
            orientation: Orientation::Named(rotation),
        }
    }

    pub const fn look(landmark: LandmarkKind, direction: Vec3) -> Self {
        Self {
            landmark,
            orientation: Orientation::LookAt(direction),
        }
    }

    pub fn resolve(&self, landmarks: &Landmarks, side: Side) -> Pose {
        Pose::new(
            landmarks.get(self.landmark, Some(side)),
            self.orientation.resolve(side),
        )
    }
}

// ============================================================================
// Strike Spec
// ============================================================================

fn default_prep() -> f32 { DEFAULT_PREP }
fn default_duration() -> f32 { DEFAULT_DURATION }

/// Data description of one strike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeSpec {
    pub name: String,
    /// Wind-up seconds
    #[serde(default = "default_prep")]
    pub prep: f32,
    /// Swing seconds
    #[serde(default = "default_duration")]
    pub duration: f32,
    /// Recovery seconds; `None` uses a fraction of `prep`
    #[serde(default)]
    pub settle: Option<f32>,
    pub major_start: TargetSpec,
    pub major_end: TargetSpec,
    #[serde(default)]
    pub minor_start: Option<TargetSpec>,
    #[serde(default)]
    pub minor_end: Option<TargetSpec>,
    #[serde(default)]
    pub torso_start: Option<TargetSpec>,
    #[serde(default)]
    pub torso_end: Option<TargetSpec>,
}

impl StrikeSpec {
    /// Minimal strike for the weapon hand only
    pub fn new(name: impl Into<String>, major_start: TargetSpec, major_end: TargetSpec) -> Self {
        Self {
            name: name.into(),
            prep: DEFAULT_PREP,
            duration: DEFAULT_DURATION,
            settle: None,
            major_start,
            major_end,
            minor_start: None,
            minor_end: None,
            torso_start: None,
            torso_end: None,
        }
    }

    pub fn with_timing(mut self, prep: f32, duration: f32) -> Self {
        self.prep = prep;
        self.duration = duration;
        self
    }

    pub fn with_settle(mut self, settle: f32) -> Self {
        self.settle = Some(settle);
        self
    }

    pub fn with_minor(mut self, start: TargetSpec, end: TargetSpec) -> Self {
        self.minor_start = Some(start);
        self.minor_end = Some(end);
        self
    }

    pub fn with_torso(mut self, start: TargetSpec, end: TargetSpec) -> Self {
        self.torso_start = Some(start);
        self.torso_end = Some(end);
        self
    }

    // ------------------------------------------------------------------------
    // Presets
    // ------------------------------------------------------------------------

    /// Hip to shoulder swing
    pub fn basic() -> Self {
        Self::new(
            "Basic",
            TargetSpec::named(LandmarkKind::Waist, NamedRotation::Forward),
            TargetSpec::named(LandmarkKind::Raised, NamedRotation::Up),
        )
    }

    pub fn jab() -> Self {
        Self::new(
            "Jab",
            TargetSpec::named(LandmarkKind::Face, NamedRotation::Up),
            TargetSpec::named(LandmarkKind::Extended, NamedRotation::Forward),
        )
        .with_minor(
            TargetSpec::named(LandmarkKind::Chest, NamedRotation::Up),
            TargetSpec::named(LandmarkKind::Face, NamedRotation::Forward),
        )
        .with_torso(
            TargetSpec::look(LandmarkKind::LeanBack, Vec3::new(1.0, 0.0, -1.0).normalize()),
            TargetSpec::look(LandmarkKind::LeanForward, Vec3::new(-1.0, 0.0, -1.0).normalize()),
        )
    }

    pub fn cross() -> Self {
        Self::new(
            "Cross",
            TargetSpec::named(LandmarkKind::Raised, NamedRotation::Forward),
            TargetSpec::named(LandmarkKind::Extended, NamedRotation::Forward),
        )
        .with_minor(
            TargetSpec::named(LandmarkKind::Chest, NamedRotation::Up),
            TargetSpec::named(LandmarkKind::Face, NamedRotation::Up),
        )
        .with_torso(
            TargetSpec::look(LandmarkKind::LeanBack, Vec3::new(0.5, 0.0, -1.0).normalize()),
            TargetSpec::look(LandmarkKind::LeanForward, Vec3::new(-0.5, 0.0, -1.0).normalize()),
        )
    }

    /// Slow, wide wind-up from behind
    pub fn haymaker() -> Self {
        Self::new(
            "Haymaker",
            TargetSpec::named(LandmarkKind::ExtendedBack, NamedRotation::Backward),
            TargetSpec::named(LandmarkKind::Extended, NamedRotation::Forward),
        )
        .with_timing(0.35, 0.12)
        .with_minor(
            TargetSpec::named(LandmarkKind::Face, NamedRotation::Up),
            TargetSpec::named(LandmarkKind::Chest, NamedRotation::Up),
        )
        .with_torso(
            TargetSpec::look(LandmarkKind::LeanBack, Vec3::new(1.0, 0.0, -0.5).normalize()),
            TargetSpec::look(LandmarkKind::LeanForward, Vec3::new(-1.0, 0.0, -0.5).normalize()),
        )
    }

    pub fn uppercut() -> Self {
        Self::new(
            "Uppercut",
            TargetSpec::named(LandmarkKind::Lowered, NamedRotation::Up),
            TargetSpec::named(LandmarkKind::Face, NamedRotation::Up),
        )
        .with_timing(0.5, 0.1)
        .with_minor(
            TargetSpec::named(LandmarkKind::Chest, NamedRotation::Up),
            TargetSpec::named(LandmarkKind::Face, NamedRotation::Up),
        )
        .with_torso(
            TargetSpec::named(LandmarkKind::LeanForward, NamedRotation::Forward),
            TargetSpec::named(LandmarkKind::LeanBack, NamedRotation::Forward),
        )
    }

    /// Timing must be finite and non-negative; start/end come in pairs
    pub fn validate(&self) -> Result<()> {
        let timing = [("prep", Some(self.prep)), ("duration", Some(self.duration)), ("settle", self.settle)];
        for (field, value) in timing {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(LimbicError::InvalidConfig(format!(
                        "strike '{}': {field} must not be negative, got {value}",
                        self.name
                    )));
                }
            }
        }
        if self.minor_start.is_some() != self.minor_end.is_some()
            || self.torso_start.is_some() != self.torso_end.is_some()
        {
            return Err(LimbicError::InvalidConfig(format!(
                "strike '{}': start and end targets must both be set",
                self.name
            )));
        }
        Ok(())
    }

    /// Concrete poses for one set of limbs
    pub fn resolve(&self, limbs: &StrikeLandmarks<'_>, settle_fraction: f32) -> Strike {
        let side = limbs.major_side;
        let major = StrikePath::new(
            self.major_start.resolve(limbs.major, side),
            self.major_end.resolve(limbs.major, side),
        );

        let minor = match (limbs.minor, self.minor_start, self.minor_end) {
            (Some(landmarks), Some(start), Some(end)) => {
                let side = side.opposite();
                Some(StrikePath::new(start.resolve(landmarks, side), end.resolve(landmarks, side)))
            }
            _ => None,
        };

        // Torso landmarks have no side; the side only mirrors the look direction
        let torso = match (limbs.torso, self.torso_start, self.torso_end) {
            (Some(landmarks), Some(start), Some(end)) => Some(StrikePath::new(
                Pose::new(landmarks.get(start.landmark, None), start.orientation.resolve(side)),
                Pose::new(landmarks.get(end.landmark, None), end.orientation.resolve(side)),
            )),
            _ => None,
        };

        Strike {
            name: self.name.clone(),
            prep: self.prep,
            duration: self.duration,
            settle: self.settle.unwrap_or(self.prep * settle_fraction),
            major,
            minor,
            torso,
        }
    }
}

// ============================================================================
// Strike
// ============================================================================

/// Landmark tables a strike resolves against
#[derive(Debug, Clone, Copy)]
pub struct StrikeLandmarks<'a> {
    pub major: &'a Landmarks,
    pub major_side: Side,
    pub minor: Option<&'a Landmarks>,
    pub torso: Option<&'a Landmarks>,
}

/// Start and end pose of one limb
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikePath {
    pub start: Pose,
    pub end: Pose,
}

impl StrikePath {
    pub fn new(start: Pose, end: Pose) -> Self {
        Self { start, end }
    }
}

/// A strike resolved for one character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strike {
    pub name: String,
    pub prep: f32,
    pub duration: f32,
    pub settle: f32,
    pub major: StrikePath,
    pub minor: Option<StrikePath>,
    pub torso: Option<StrikePath>,
}

impl Strike {
    /// Wind-up plus swing plus recovery
    pub fn total_time(&self) -> f32 {
        self.prep + self.duration + self.settle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::LandmarkBasis;

    fn landmarks(side: Option<Side>) -> Landmarks {
        let x = side.map_or(0.0, |s| 0.18 * s.sign());
        Landmarks::new(LandmarkBasis {
            torso_root: Vec3::new(0.0, 0.9, 0.0),
            chest: Vec3::new(0.0, 1.32, 0.0),
            neck: Vec3::new(0.0, 1.5, 0.0),
            torso_width: 0.36,
            torso_depth: 0.22,
            torso_length: 0.6,
            limb_root: Vec3::new(x, 1.45, 0.0),
            limb_length: 0.62,
            side,
        })
    }

    #[test]
    fn test_presets_validate() {
        for spec in [
            StrikeSpec::basic(),
            StrikeSpec::jab(),
            StrikeSpec::cross(),
            StrikeSpec::haymaker(),
            StrikeSpec::uppercut(),
        ] {
            assert!(spec.validate().is_ok(), "{}", spec.name);
        }
    }

    #[test]
    fn test_validate_rejects_negative_and_unpaired() {
        let spec = StrikeSpec::basic().with_timing(-0.1, 0.1);
        assert!(matches!(spec.validate(), Err(LimbicError::InvalidConfig(_))));

        let mut spec = StrikeSpec::jab();
        spec.minor_end = None;
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_resolve_uses_landmarks_and_settle_fraction() {
        let right = landmarks(Some(Side::Right));
        let left = landmarks(Some(Side::Left));
        let torso = landmarks(None);
        let strike = StrikeSpec::jab().resolve(
            &StrikeLandmarks {
                major: &right,
                major_side: Side::Right,
                minor: Some(&left),
                torso: Some(&torso),
            },
            0.1,
        );
        assert_eq!(strike.major.start.position, right.get(LandmarkKind::Face, Some(Side::Right)));
        assert_eq!(strike.major.end.position, right.get(LandmarkKind::Extended, Some(Side::Right)));
        let minor = strike.minor.expect("jab uses the off hand");
        assert_eq!(minor.start.position, left.get(LandmarkKind::Chest, Some(Side::Left)));
        assert!(strike.torso.is_some());
        assert!((strike.settle - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_left_handed_strike_mirrors() {
        let right = landmarks(Some(Side::Right));
        let left = landmarks(Some(Side::Left));
        let torso = landmarks(None);
        let spec = StrikeSpec::jab();
        let r = spec.resolve(
            &StrikeLandmarks { major: &right, major_side: Side::Right, minor: Some(&left), torso: Some(&torso) },
            0.1,
        );
        let l = spec.resolve(
            &StrikeLandmarks { major: &left, major_side: Side::Left, minor: Some(&right), torso: Some(&torso) },
            0.1,
        );
        let mirror = |v: Vec3| Vec3::new(-v.x, v.y, v.z);
        assert!((mirror(r.major.start.position) - l.major.start.position).length() < 1e-5);

        let r_look = r.torso.unwrap().start.rotation * BodyAxes::FORWARD;
        let l_look = l.torso.unwrap().start.rotation * BodyAxes::FORWARD;
        assert!((mirror(r_look) - l_look).length() < 1e-4);
    }

    #[test]
    fn test_explicit_settle_wins() {
        let right = landmarks(Some(Side::Right));
        let strike = StrikeSpec::basic().with_settle(0.12).resolve(
            &StrikeLandmarks { major: &right, major_side: Side::Right, minor: None, torso: None },
            0.1,
        );
        assert_eq!(strike.settle, 0.12);
        assert!(strike.minor.is_none());
    }
}
