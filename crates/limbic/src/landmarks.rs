//! # Landmarks
//!
//! Named, side-aware reference positions derived from torso and limb
//! geometry: where a hand rests at the waist, where a punch ends, where the
//! torso leans back to.
//!
//! ## Features
//!
//! - **Closed set**: [`LandmarkKind`] replaces lookup by type name
//! - **Mirrored**: each calculation takes the side and reflects its lateral offset
//! - **Memoized**: computed on first read per side, cleared by [`Landmarks::recalculate`]
//!
//! All positions are in the character's body frame.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{LimbicError, Result};
use crate::limb::Side;
use crate::math::{BodyAxes, Vec3};

// ============================================================================
// Landmark Kinds
// ============================================================================

/// Every landmark a limb can be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandmarkKind {
    /// Beside the hip, where a weapon is braced or sheathed
    Holster,
    /// Beside the waist, arms held comfortably
    Waist,
    /// Like `Waist` but further out to the side
    WideWaist,
    /// In front of the chest
    Chest,
    /// In front of the face
    Face,
    /// Over the shoulder, weapon raised
    Raised,
    /// Straight ahead at arm's reach. No side offset.
    Extended,
    /// Straight behind, reared back. No side offset.
    ExtendedBack,
    /// Hanging below the limb's own root. Uses the limb root, so only
    /// symmetric between mirrored limbs.
    Lowered,
    /// Chest pulled slightly back. No side offset.
    LeanBack,
    /// Chest pushed slightly forward. No side offset.
    LeanForward,
}

impl LandmarkKind {
    pub const ALL: [LandmarkKind; 11] = [
        LandmarkKind::Holster,
        LandmarkKind::Waist,
        LandmarkKind::WideWaist,
        LandmarkKind::Chest,
        LandmarkKind::Face,
        LandmarkKind::Raised,
        LandmarkKind::Extended,
        LandmarkKind::ExtendedBack,
        LandmarkKind::Lowered,
        LandmarkKind::LeanBack,
        LandmarkKind::LeanForward,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LandmarkKind::Holster => "Holster",
            LandmarkKind::Waist => "Waist",
            LandmarkKind::WideWaist => "WideWaist",
            LandmarkKind::Chest => "Chest",
            LandmarkKind::Face => "Face",
            LandmarkKind::Raised => "Raised",
            LandmarkKind::Extended => "Extended",
            LandmarkKind::ExtendedBack => "ExtendedBack",
            LandmarkKind::Lowered => "Lowered",
            LandmarkKind::LeanBack => "LeanBack",
            LandmarkKind::LeanForward => "LeanForward",
        }
    }

    /// Whether left and right results mirror across the sagittal plane
    pub fn is_mirrored(self) -> bool {
        matches!(
            self,
            LandmarkKind::Holster
                | LandmarkKind::Waist
                | LandmarkKind::WideWaist
                | LandmarkKind::Chest
                | LandmarkKind::Face
                | LandmarkKind::Raised
        )
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for LandmarkKind {
    type Err = LimbicError;

    fn from_str(s: &str) -> Result<Self> {
        LandmarkKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| LimbicError::UnknownLandmark(s.to_string()))
    }
}

// ============================================================================
// Landmark Basis
// ============================================================================

/// Torso and limb measurements the landmark formulas read
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkBasis {
    /// Torso root bone (hips)
    pub torso_root: Vec3,
    /// Chest bone
    pub chest: Vec3,
    /// Top of the torso chain (neck), used for face-height landmarks
    pub neck: Vec3,
    pub torso_width: f32,
    pub torso_depth: f32,
    pub torso_length: f32,
    /// This limb's root joint
    pub limb_root: Vec3,
    /// This limb's rest length
    pub limb_length: f32,
    /// This limb's own side, if it has one
    pub side: Option<Side>,
}

impl LandmarkBasis {
    fn calculate(&self, kind: LandmarkKind, side: Side) -> Vec3 {
        let right = BodyAxes::RIGHT * side.sign();
        let up = BodyAxes::UP;
        let forward = BodyAxes::FORWARD;

        match kind {
            LandmarkKind::Holster => self.torso_root + right * self.torso_width * 0.5,
            LandmarkKind::Waist => {
                self.torso_root + up * self.torso_length * 0.1 + right * self.torso_width * 0.6
            }
            LandmarkKind::WideWaist => {
                self.calculate(LandmarkKind::Waist, side) + right * self.torso_width * 0.3
            }
            LandmarkKind::Chest => {
                self.chest + forward * self.torso_depth * 0.5 + right * self.torso_width * 0.25
            }
            LandmarkKind::Face => {
                self.neck + forward * self.torso_depth * 0.5 + right * self.torso_width * 0.1
            }
            LandmarkKind::Raised => {
                self.neck - forward * self.torso_width * 0.2 + right * self.torso_width * 1.1
            }
            LandmarkKind::Extended => self.chest + forward * self.limb_length,
            LandmarkKind::ExtendedBack => self.chest - forward * self.limb_length * 1.8,
            LandmarkKind::Lowered => self.limb_root - up * self.limb_length * 0.85,
            LandmarkKind::LeanBack => self.chest - forward * self.torso_depth * 0.1,
            LandmarkKind::LeanForward => self.chest + forward * self.torso_depth * 0.1,
        }
    }
}

// ============================================================================
// Landmarks
// ============================================================================

type SideCache = [OnceLock<Vec3>; 2];

/// Memoized landmark table for one limb
#[derive(Debug, Clone)]
pub struct Landmarks {
    basis: LandmarkBasis,
    cache: Vec<SideCache>,
}

impl Landmarks {
    pub fn new(basis: LandmarkBasis) -> Self {
        Self {
            basis,
            cache: Self::empty_cache(),
        }
    }

    fn empty_cache() -> Vec<SideCache> {
        LandmarkKind::ALL
            .iter()
            .map(|_| [OnceLock::new(), OnceLock::new()])
            .collect()
    }

    pub fn basis(&self) -> &LandmarkBasis {
        &self.basis
    }

    /// Side used when a caller doesn't name one (limbs without a side read
    /// the right-hand variant)
    pub fn default_side(&self) -> Side {
        self.basis.side.unwrap_or(Side::Right)
    }

    /// Landmark position for `side`, or this limb's own side
    pub fn get(&self, kind: LandmarkKind, side: Option<Side>) -> Vec3 {
        let side = side.unwrap_or_else(|| self.default_side());
        let slot = &self.cache[kind.index()][side.index()];
        *slot.get_or_init(|| self.basis.calculate(kind, side))
    }

    /// String-keyed lookup for debug tooling and config
    pub fn get_named(&self, name: &str, side: Option<Side>) -> Result<Vec3> {
        let kind = name.parse::<LandmarkKind>()?;
        Ok(self.get(kind, side))
    }

    /// Drop memoized positions, e.g. after the limb's bounds change
    pub fn recalculate(&mut self) {
        self.cache = Self::empty_cache();
    }

    /// Swap in new measurements and drop memoized positions
    pub fn rebase(&mut self, basis: LandmarkBasis) {
        self.basis = basis;
        self.recalculate();
    }
}
