//! # Curves
//!
//! One-dimensional keyframe curves addressed by [`CurveKey`].
//!
//! ## Features
//!
//! - **Linear keyframes**: piecewise-linear `f(progress) -> value`
//! - **Wrap modes**: `Loop` for cyclic gait curves, `Clamp` for one-shots
//! - **Library**: serde-serialisable map with built-in default shapes
//!
//! Curves are checked when a character is built. `evaluate` itself never
//! fails: an empty curve evaluates to zero.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{LimbicError, Result};

// ============================================================================
// Curve Keys
// ============================================================================

/// Every curve the pose generators sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CurveKey {
    /// Foot height over one step (may dip below zero during stance)
    Foot,
    /// Foot pitch over one step, in half-turns
    FootRot,
    /// Hand longitudinal offset over one arm pump, in arm lengths
    HandZ,
    /// Hand vertical offset over one arm pump, in arm lengths
    HandY,
    /// Blend from lowered to forward hand rotation
    HandRot,
    /// Hip height over one footfall, in step heights
    HipBounce,
}

impl CurveKey {
    pub const ALL: [CurveKey; 6] = [
        CurveKey::Foot,
        CurveKey::FootRot,
        CurveKey::HandZ,
        CurveKey::HandY,
        CurveKey::HandRot,
        CurveKey::HipBounce,
    ];
}

impl fmt::Display for CurveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ============================================================================
// Curve
// ============================================================================

/// How a curve is sampled outside its key range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WrapMode {
    /// Repeat the key range
    #[default]
    Loop,
    /// Hold the first/last value
    Clamp,
}

/// A single (time, value) key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
}

/// Piecewise-linear curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCurve")]
pub struct Curve {
    /// Keys, sorted by time
    pub keys: Vec<Keyframe>,
    /// Sampling behaviour outside the key range
    #[serde(default)]
    pub wrap: WrapMode,
}

/// On-disk shape; loaded keys go through [`Curve::new`] so they come out sorted
#[derive(Deserialize)]
struct RawCurve {
    keys: Vec<Keyframe>,
    #[serde(default)]
    wrap: WrapMode,
}

impl From<RawCurve> for Curve {
    fn from(raw: RawCurve) -> Self {
        Curve::new(raw.keys, raw.wrap)
    }
}

impl Curve {
    pub fn new(mut keys: Vec<Keyframe>, wrap: WrapMode) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys, wrap }
    }

    /// Build from `(time, value)` pairs
    pub fn from_points(points: &[(f32, f32)], wrap: WrapMode) -> Self {
        Self::new(
            points
                .iter()
                .map(|&(time, value)| Keyframe { time, value })
                .collect(),
            wrap,
        )
    }

    /// Constant curve
    pub fn constant(value: f32) -> Self {
        Self::from_points(&[(0.0, value)], WrapMode::Clamp)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Every key finite and in time order
    pub fn is_well_formed(&self) -> bool {
        self.keys.iter().all(|k| k.time.is_finite() && k.value.is_finite())
            && self.keys.windows(2).all(|w| w[0].time <= w[1].time)
    }

    /// Sample the curve at `t`
    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if !t.is_finite() || first.time.is_nan() || last.time.is_nan() || first.time > last.time {
            return first.value;
        }

        let span = last.time - first.time;
        let t = match self.wrap {
            WrapMode::Loop if span > 0.0 => first.time + (t - first.time).rem_euclid(span),
            _ => t.clamp(first.time, last.time),
        };

        // First key at or after t
        let upper = self.keys.partition_point(|k| k.time < t);
        if upper == 0 {
            return first.value;
        }
        if upper >= self.keys.len() {
            return last.value;
        }
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let gap = b.time - a.time;
        if gap <= f32::EPSILON {
            return b.value;
        }
        a.value + (b.value - a.value) * ((t - a.time) / gap)
    }
}

// ============================================================================
// Curve Library
// ============================================================================

/// The curve set a character samples from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveLibrary {
    pub curves: HashMap<CurveKey, Curve>,
}

impl Default for CurveLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CurveLibrary {
    pub fn empty() -> Self {
        Self {
            curves: HashMap::new(),
        }
    }

    /// Default shapes for every [`CurveKey`]
    pub fn builtin() -> Self {
        let mut curves = HashMap::new();
        // Lift through the first half, sink below the ground during stance
        curves.insert(
            CurveKey::Foot,
            Curve::from_points(
                &[(0.0, 0.0), (0.25, 1.0), (0.5, 0.0), (0.75, -0.5), (1.0, 0.0)],
                WrapMode::Loop,
            ),
        );
        curves.insert(
            CurveKey::FootRot,
            Curve::from_points(
                &[(0.0, 0.5), (0.25, 0.35), (0.5, 0.5), (0.75, 0.6), (1.0, 0.5)],
                WrapMode::Loop,
            ),
        );
        curves.insert(
            CurveKey::HandZ,
            Curve::from_points(&[(0.0, -0.3), (0.5, 0.3), (1.0, -0.3)], WrapMode::Loop),
        );
        curves.insert(
            CurveKey::HandY,
            Curve::from_points(&[(0.0, 0.0), (0.5, 0.35), (1.0, 0.0)], WrapMode::Loop),
        );
        curves.insert(
            CurveKey::HandRot,
            Curve::from_points(&[(0.0, 0.0), (0.5, 1.0), (1.0, 0.0)], WrapMode::Loop),
        );
        curves.insert(
            CurveKey::HipBounce,
            Curve::from_points(&[(0.0, 0.0), (0.5, -1.0), (1.0, 0.0)], WrapMode::Loop),
        );
        Self { curves }
    }

    pub fn with(mut self, key: CurveKey, curve: Curve) -> Self {
        self.curves.insert(key, curve);
        self
    }

    pub fn insert(&mut self, key: CurveKey, curve: Curve) {
        self.curves.insert(key, curve);
    }

    pub fn get(&self, key: CurveKey) -> Option<&Curve> {
        self.curves.get(&key)
    }

    /// Look up a curve that must exist and have keys
    pub fn require(&self, key: CurveKey) -> Result<&Curve> {
        let curve = self.curves.get(&key).ok_or(LimbicError::MissingCurve(key))?;
        if curve.is_empty() {
            return Err(LimbicError::EmptyCurve(key));
        }
        if !curve.is_well_formed() {
            return Err(LimbicError::MalformedCurve(key));
        }
        Ok(curve)
    }

    /// Check that every key is present, non-empty and finite
    pub fn validate(&self) -> Result<()> {
        for key in CurveKey::ALL {
            self.require(key)?;
        }
        Ok(())
    }

    /// Sample a curve; zero if absent (validated libraries never hit that)
    #[inline]
    pub fn sample(&self, key: CurveKey, t: f32) -> f32 {
        self.curves.get(&key).map_or(0.0, |c| c.evaluate(t))
    }
}
