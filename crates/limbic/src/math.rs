//! # Pose Math
//!
//! Small vector/quaternion helpers shared by every pose generator.
//!
//! ## Conventions
//!
//! All limb targets live in the character's local body frame:
//! right = +X, up = +Y, forward = -Z (the Bevy convention).

pub use bevy::math::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::LimbicError;

/// Floor used wherever a locomotion-derived quantity ends up in a denominator
pub const EPSILON: f32 = 1e-4;

/// Full turn in radians
pub const TAU: f32 = std::f32::consts::TAU;

// ============================================================================
// Body Axes
// ============================================================================

/// Unit axes of the character's local body frame
pub struct BodyAxes;

impl BodyAxes {
    pub const RIGHT: Vec3 = Vec3::X;
    pub const UP: Vec3 = Vec3::Y;
    pub const FORWARD: Vec3 = Vec3::NEG_Z;
}

// ============================================================================
// Pose
// ============================================================================

/// Position + orientation pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Linear position blend with normalized-lerp rotation
    pub fn lerp(&self, other: &Pose, t: f32) -> Pose {
        Pose {
            position: self.position.lerp(other.position, t),
            rotation: self.rotation.lerp(other.rotation, t),
        }
    }

    /// Transform a point from this pose's local space into its parent space
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Transform a point from parent space into this pose's local space
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.position)
    }
}

// ============================================================================
// Scalar helpers
// ============================================================================

/// Remap a value from one range to another, clamped to the output range
pub fn remap(value: f32, in_start: f32, in_end: f32, out_start: f32, out_end: f32) -> f32 {
    let span = in_end - in_start;
    if span.abs() < EPSILON {
        return out_start;
    }
    let v = (value - in_start) / span * (out_end - out_start) + out_start;
    let (lo, hi) = if out_start <= out_end {
        (out_start, out_end)
    } else {
        (out_end, out_start)
    };
    v.clamp(lo, hi)
}

/// Exponential-decay step for smoothed placement, clamped so a long frame
/// lands on the destination instead of overshooting it
#[inline]
pub fn smoothing_factor(rate: f32, dt: f32) -> f32 {
    (rate * dt).clamp(0.0, 1.0)
}

/// Wrap a cyclic progress value into [0, 1)
#[inline]
pub fn wrap_unit(p: f32) -> f32 {
    let w = p.rem_euclid(1.0);
    // rem_euclid can return exactly 1.0 for tiny negative inputs
    if w >= 1.0 {
        0.0
    } else {
        w
    }
}

/// Replace NaN/inf with a fallback
#[inline]
pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

// ============================================================================
// Line projections
// ============================================================================

/// Closest point on the segment `start..end` to `point`
pub fn closest_on_line(point: Vec3, start: Vec3, end: Vec3) -> Vec3 {
    let heading = end - start;
    let max_length = heading.length();
    let dir = heading.normalize_or_zero();
    let along = (point - start).dot(dir).clamp(0.0, max_length);
    start + dir * along
}

/// Vector from the segment to `point`
pub fn project_to_line(point: Vec3, start: Vec3, end: Vec3) -> Vec3 {
    point - closest_on_line(point, start, end)
}

/// Distance between `point` and the segment `start..end`
pub fn distance_to_line(point: Vec3, start: Vec3, end: Vec3) -> f32 {
    project_to_line(point, start, end).length()
}

/// Signed side test: negative is left, positive is right
pub fn left_or_right(forward: Vec3, up: Vec3, direction: Vec3) -> f32 {
    // forward x direction points down for directions on the right
    -forward.cross(direction).dot(up)
}

/// Yaw (around +Y) that turns the body forward onto a horizontal heading
pub fn heading_yaw(direction: Vec3) -> f32 {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() < EPSILON * EPSILON {
        return 0.0;
    }
    f32::atan2(-flat.x, -flat.z)
}

/// Look rotation whose -Z axis points along `direction`
pub fn look_rotation(direction: Vec3, up: Vec3) -> Quat {
    let forward = direction.normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut right = up.cross(-forward);
    if right.length_squared() < EPSILON {
        // Looking straight along up - pick any perpendicular
        right = forward.any_orthonormal_vector();
    }
    let right = right.normalize();
    let true_up = (-forward).cross(right);
    Quat::from_mat3(&bevy::math::Mat3::from_cols(right, true_up, -forward))
}

// ============================================================================
// Named rotations
// ============================================================================

/// Hand/foot orientation presets.
///
/// Some are a degree off axis so an interpolation picks a consistent way round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedRotation {
    Forward,
    Backward,
    Up,
    UpLeft,
    Down,
    Left,
    Right,
    FlatForward,
}

impl NamedRotation {
    pub const ALL: [NamedRotation; 8] = [
        NamedRotation::Forward,
        NamedRotation::Backward,
        NamedRotation::Up,
        NamedRotation::UpLeft,
        NamedRotation::Down,
        NamedRotation::Left,
        NamedRotation::Right,
        NamedRotation::FlatForward,
    ];

    /// Euler angles (x, y, z) in degrees
    pub fn euler_degrees(self) -> Vec3 {
        match self {
            NamedRotation::Forward => Vec3::new(0.0, 90.0, 90.0),
            NamedRotation::Backward => Vec3::new(0.0, -90.0, 90.0),
            NamedRotation::Up => Vec3::new(0.0, 90.0, 1.0),
            NamedRotation::UpLeft => Vec3::new(0.0, -90.0, 1.0),
            NamedRotation::Down => Vec3::new(0.0, 90.0, 180.0),
            NamedRotation::Left => Vec3::new(0.0, 0.0, 90.0),
            NamedRotation::Right => Vec3::new(0.0, 0.0, -90.0),
            NamedRotation::FlatForward => Vec3::new(90.0, 0.0, 0.0),
        }
    }

    pub fn quat(self) -> Quat {
        euler_degrees(self.euler_degrees())
    }

    /// Up for the given side (the left hand mirrors the yaw)
    pub fn up_for(left: bool) -> NamedRotation {
        if left {
            NamedRotation::UpLeft
        } else {
            NamedRotation::Up
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NamedRotation::Forward => "Forward",
            NamedRotation::Backward => "Backward",
            NamedRotation::Up => "Up",
            NamedRotation::UpLeft => "UpLeft",
            NamedRotation::Down => "Down",
            NamedRotation::Left => "Left",
            NamedRotation::Right => "Right",
            NamedRotation::FlatForward => "FlatForward",
        }
    }
}

impl FromStr for NamedRotation {
    type Err = LimbicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NamedRotation::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| LimbicError::UnknownRotation(s.to_string()))
    }
}

/// Quaternion from (x, y, z) degrees, applied z then x then y.
///
/// Angles are authored in a left-handed, +Z-forward frame (the convention
/// most rig tooling exports), so x and y turn the other way here.
pub fn euler_degrees(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        -degrees.y.to_radians(),
        -degrees.x.to_radians(),
        degrees.z.to_radians(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remap_clamps() {
        assert!((remap(5.0, 0.0, 10.0, 0.0, 1.0) - 0.5).abs() < 1e-6);
        assert_eq!(remap(20.0, 0.0, 10.0, 0.0, 1.0), 1.0);
        assert_eq!(remap(-3.0, 0.0, 10.0, 0.0, 1.0), 0.0);
        assert_eq!(remap(1.0, 2.0, 2.0, 4.0, 8.0), 4.0);
    }

    #[test]
    fn test_closest_on_segment() {
        let p = closest_on_line(Vec3::new(0.5, 1.0, 0.0), Vec3::ZERO, Vec3::X);
        assert!((p - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);
        let beyond = closest_on_line(Vec3::new(3.0, 1.0, 0.0), Vec3::ZERO, Vec3::X);
        assert!((beyond - Vec3::X).length() < 1e-6);
        assert!((distance_to_line(Vec3::new(0.5, 2.0, 0.0), Vec3::ZERO, Vec3::X) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_left_or_right_sign() {
        let f = BodyAxes::FORWARD;
        assert!(left_or_right(f, Vec3::Y, Vec3::X) > 0.0);
        assert!(left_or_right(f, Vec3::Y, Vec3::NEG_X) < 0.0);
    }

    #[test]
    fn test_heading_yaw_maps_forward_onto_direction() {
        for dir in [Vec3::X, Vec3::NEG_X, Vec3::Z, Vec3::NEG_Z, Vec3::new(1.0, 0.0, 1.0)] {
            let yaw = heading_yaw(dir);
            let turned = Quat::from_rotation_y(yaw) * BodyAxes::FORWARD;
            assert!((turned - dir.normalize()).length() < 1e-5, "{dir:?}");
        }
        assert_eq!(heading_yaw(Vec3::ZERO), 0.0);
    }

    #[test]
    fn test_look_rotation_points_forward_axis() {
        let dir = Vec3::new(1.0, 0.0, -1.0).normalize();
        let q = look_rotation(dir, Vec3::Y);
        assert!((q * Vec3::NEG_Z - dir).length() < 1e-5);
        assert_eq!(look_rotation(Vec3::ZERO, Vec3::Y), Quat::IDENTITY);
    }

    #[test]
    fn test_named_rotation_parse() {
        assert_eq!("up".parse::<NamedRotation>().unwrap(), NamedRotation::Up);
        assert!(matches!(
            "Sideways".parse::<NamedRotation>(),
            Err(LimbicError::UnknownRotation(_))
        ));
    }

    #[test]
    fn test_flat_forward_points_down() {
        let q = NamedRotation::FlatForward.quat();
        assert!((q * BodyAxes::FORWARD - Vec3::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn test_wrap_unit() {
        assert!((wrap_unit(1.25) - 0.25).abs() < 1e-6);
        assert!((wrap_unit(-0.25) - 0.75).abs() < 1e-6);
        assert!(wrap_unit(-1e-9) < 1.0);
    }
}
