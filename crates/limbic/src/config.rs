//! # Character Configuration
//!
//! RON-based tuning for one procedurally animated character.
//!
//! Every field carries a serde default, so a config file only needs to name
//! what it changes:
//!
//! ```ron
//! (
//!     gait: (stride_hertz: 2.0),
//!     spring: (damp_ratio: 0.8),
//! )
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::combat::WeaponSpec;
use crate::curves::CurveLibrary;
use crate::error::{LimbicError, Result};
use crate::limb::Side;
use crate::math::EPSILON;
use crate::rig::BodyDimensions;

// ============================================================================
// Sections
// ============================================================================

/// Movement speeds and ground-loss tolerance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocomotionConfig {
    #[serde(default = "default_walk_speed")]
    pub walk_speed: f32,
    #[serde(default = "default_run_speed")]
    pub run_speed: f32,
    /// Seconds without ground contact before the gait goes airborne
    #[serde(default = "default_coyote_time")]
    pub coyote_time: f32,
}

fn default_walk_speed() -> f32 { 2.0 }
fn default_run_speed() -> f32 { 5.0 }
fn default_coyote_time() -> f32 { 0.5 }

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            walk_speed: default_walk_speed(),
            run_speed: default_run_speed(),
            coyote_time: default_coyote_time(),
        }
    }
}

/// Smoothed target placement rates (per second)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    #[serde(default = "default_placement_rate")]
    pub position_rate: f32,
    #[serde(default = "default_placement_rate")]
    pub rotation_rate: f32,
}

fn default_placement_rate() -> f32 { 30.0 }

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            position_rate: default_placement_rate(),
            rotation_rate: default_placement_rate(),
        }
    }
}

/// Leg step cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaitConfig {
    /// Step cycles per second
    #[serde(default = "default_stride_hertz")]
    pub stride_hertz: f32,
    /// Derive cadence from speed and stride length instead of a fixed rate
    #[serde(default)]
    pub speed_synced: bool,
    /// Max step length, in leg lengths
    #[serde(default = "default_step_length_ratio")]
    pub step_length_ratio: f32,
    /// Max step height, in leg lengths
    #[serde(default = "default_step_height_ratio")]
    pub step_height_ratio: f32,
    /// Cap on the forward-rush factor applied to step length
    #[serde(default = "default_forward_bias_cap")]
    pub forward_bias_cap: f32,
    /// Stationary ground probe length, in leg lengths
    #[serde(default = "default_ground_probe_ratio")]
    pub ground_probe_ratio: f32,
    /// How fast feet tuck up while airborne
    #[serde(default = "default_air_crouch_rate")]
    pub air_crouch_rate: f32,
    /// Knee hint distance in front of the knee, in leg lengths
    #[serde(default = "default_hint_forward_ratio")]
    pub hint_forward_ratio: f32,
}

fn default_stride_hertz() -> f32 { 1.5 }
fn default_step_length_ratio() -> f32 { 2.5 }
fn default_step_height_ratio() -> f32 { 0.5 }
fn default_forward_bias_cap() -> f32 { 0.2 }
fn default_ground_probe_ratio() -> f32 { 1.5 }
fn default_air_crouch_rate() -> f32 { 20.0 }
fn default_hint_forward_ratio() -> f32 { 0.2 }

impl Default for GaitConfig {
    fn default() -> Self {
        Self {
            stride_hertz: default_stride_hertz(),
            speed_synced: false,
            step_length_ratio: default_step_length_ratio(),
            step_height_ratio: default_step_height_ratio(),
            forward_bias_cap: default_forward_bias_cap(),
            ground_probe_ratio: default_ground_probe_ratio(),
            air_crouch_rate: default_air_crouch_rate(),
            hint_forward_ratio: default_hint_forward_ratio(),
        }
    }
}

impl GaitConfig {
    /// Step cycles per second for the current speed and step length.
    ///
    /// The speed-synced rate keeps planted feet from sliding: one cycle
    /// covers four step lengths of ground.
    pub fn cadence(&self, speed: f32, step_length: f32) -> f32 {
        if !self.speed_synced {
            return self.stride_hertz;
        }
        let stride = (4.0 * step_length).max(EPSILON);
        (speed / stride).clamp(0.0, self.stride_hertz * 2.0)
    }
}

/// Secondary-motion spring on arm targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_stiffness")]
    pub stiffness: f32,
    #[serde(default = "default_damp_ratio")]
    pub damp_ratio: f32,
    #[serde(default = "default_body_coupling")]
    pub body_coupling: f32,
}

fn default_true() -> bool { true }
fn default_stiffness() -> f32 { 500.0 }
fn default_damp_ratio() -> f32 { 0.5 }
fn default_body_coupling() -> f32 { 0.05 }

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stiffness: default_stiffness(),
            damp_ratio: default_damp_ratio(),
            body_coupling: default_body_coupling(),
        }
    }
}

/// Arm pump and elbow hint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmConfig {
    /// Max pump yaw away from straight ahead, degrees
    #[serde(default = "default_pump_yaw_limit")]
    pub pump_yaw_limit_degrees: f32,
    /// Elbow hint distance behind the waist, in arm depths
    #[serde(default = "default_hint_back_ratio")]
    pub hint_back_ratio: f32,
    /// Elbow hint height above the waist, in arm lengths
    #[serde(default = "default_hint_up_ratio")]
    pub hint_up_ratio: f32,
}

fn default_pump_yaw_limit() -> f32 { 45.0 }
fn default_hint_back_ratio() -> f32 { 2.0 }
fn default_hint_up_ratio() -> f32 { 1.0 }

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            pump_yaw_limit_degrees: default_pump_yaw_limit(),
            hint_back_ratio: default_hint_back_ratio(),
            hint_up_ratio: default_hint_up_ratio(),
        }
    }
}

/// Torso lean, bounce, twist and breathing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorsoConfig {
    /// Max lean, in torso lengths
    #[serde(default = "default_lean_ratio")]
    pub lean_ratio: f32,
    /// Twist, in torso widths per unit forward rush
    #[serde(default = "default_twist_ratio")]
    pub twist_ratio: f32,
    /// Lean floor applied even when moving sideways
    #[serde(default = "default_min_forward_lean")]
    pub min_forward_lean: f32,
    /// Extra forward lean while crouched
    #[serde(default = "default_crouch_lean")]
    pub crouch_lean: f32,
    /// Downward aim while crouched
    #[serde(default = "default_crouch_pitch")]
    pub crouch_pitch: f32,
    /// Side-to-side wobble, as a fraction of the max lean width
    #[serde(default = "default_wobble_ratio")]
    pub wobble_ratio: f32,
    /// Hip sink per unit step length
    #[serde(default = "default_bounce_sink_ratio")]
    pub bounce_sink_ratio: f32,
    #[serde(default = "default_breath_hertz")]
    pub breath_hertz: f32,
    #[serde(default = "default_breath_amplitude")]
    pub breath_amplitude: f32,
    /// Head lean, as a fraction of the torso lean
    #[serde(default = "default_head_lean_ratio")]
    pub head_lean_ratio: f32,
    #[serde(default = "default_placement_rate")]
    pub head_follow_rate: f32,
}

fn default_lean_ratio() -> f32 { 0.45 }
fn default_twist_ratio() -> f32 { 0.8 }
fn default_min_forward_lean() -> f32 { 0.3 }
fn default_crouch_lean() -> f32 { 0.2 }
fn default_crouch_pitch() -> f32 { 0.5 }
fn default_wobble_ratio() -> f32 { 0.15 }
fn default_bounce_sink_ratio() -> f32 { 0.1 }
fn default_breath_hertz() -> f32 { 0.2 }
fn default_breath_amplitude() -> f32 { 0.05 }
fn default_head_lean_ratio() -> f32 { 0.4 }

impl Default for TorsoConfig {
    fn default() -> Self {
        Self {
            lean_ratio: default_lean_ratio(),
            twist_ratio: default_twist_ratio(),
            min_forward_lean: default_min_forward_lean(),
            crouch_lean: default_crouch_lean(),
            crouch_pitch: default_crouch_pitch(),
            wobble_ratio: default_wobble_ratio(),
            bounce_sink_ratio: default_bounce_sink_ratio(),
            breath_hertz: default_breath_hertz(),
            breath_amplitude: default_breath_amplitude(),
            head_lean_ratio: default_head_lean_ratio(),
            head_follow_rate: default_placement_rate(),
        }
    }
}

/// Attack buffering and strike pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatConfig {
    /// Buffered requests beyond this are dropped
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Buffered requests older than this (seconds) expire
    #[serde(default = "default_buffer_max_age")]
    pub buffer_max_age: f32,
    /// Settle time as a fraction of prep, for strikes that don't set one
    #[serde(default = "default_settle_fraction")]
    pub settle_fraction: f32,
    /// Hand that carries the weapon
    #[serde(default = "default_major_side")]
    pub major_side: Side,
}

fn default_buffer_capacity() -> usize { 5 }
fn default_buffer_max_age() -> f32 { 0.5 }
fn default_settle_fraction() -> f32 { 0.1 }
fn default_major_side() -> Side { Side::Right }

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            buffer_max_age: default_buffer_max_age(),
            settle_fraction: default_settle_fraction(),
            major_side: default_major_side(),
        }
    }
}

// ============================================================================
// Character Config
// ============================================================================

/// Complete tuning for one character
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, bevy::prelude::Resource)]
pub struct CharacterConfig {
    #[serde(default)]
    pub dimensions: BodyDimensions,
    #[serde(default)]
    pub locomotion: LocomotionConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub gait: GaitConfig,
    #[serde(default)]
    pub spring: SpringConfig,
    #[serde(default)]
    pub arm: ArmConfig,
    #[serde(default)]
    pub torso: TorsoConfig,
    #[serde(default)]
    pub combat: CombatConfig,
    #[serde(default)]
    pub curves: CurveLibrary,
    /// Weapon equipped when the character is built
    #[serde(default = "WeaponSpec::fists")]
    pub weapon: WeaponSpec,
}

impl CharacterConfig {
    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&content)?;
        tracing::debug!("Loaded character config from {}", path.display());
        Ok(config)
    }

    /// Load from a RON file or return default
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            match Self::load(path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load character config {}: {}", path.display(), e);
                }
            }
        }
        Self::default()
    }

    /// Save to a RON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_ron_string()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Parse and validate
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config: Self = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(6)
            .separate_tuple_members(true);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Reject values the generators cannot run with
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f32) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(LimbicError::InvalidConfig(format!("{name} must be positive, got {value}")))
            }
        }
        fn non_negative(name: &str, value: f32) -> Result<()> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(LimbicError::InvalidConfig(format!("{name} must not be negative, got {value}")))
            }
        }

        positive("locomotion.run_speed", self.locomotion.run_speed)?;
        non_negative("locomotion.walk_speed", self.locomotion.walk_speed)?;
        non_negative("locomotion.coyote_time", self.locomotion.coyote_time)?;
        non_negative("placement.position_rate", self.placement.position_rate)?;
        non_negative("placement.rotation_rate", self.placement.rotation_rate)?;
        non_negative("gait.stride_hertz", self.gait.stride_hertz)?;
        non_negative("gait.step_length_ratio", self.gait.step_length_ratio)?;
        non_negative("gait.step_height_ratio", self.gait.step_height_ratio)?;
        positive("gait.ground_probe_ratio", self.gait.ground_probe_ratio)?;
        non_negative("spring.stiffness", self.spring.stiffness)?;
        non_negative("spring.damp_ratio", self.spring.damp_ratio)?;
        non_negative("combat.buffer_max_age", self.combat.buffer_max_age)?;
        non_negative("combat.settle_fraction", self.combat.settle_fraction)?;
        positive("dimensions.leg_length", self.dimensions.leg_length)?;
        positive("dimensions.torso_length", self.dimensions.torso_length)?;
        positive("dimensions.arm_length", self.dimensions.arm_length)?;

        if self.combat.buffer_capacity == 0 {
            return Err(LimbicError::InvalidConfig(
                "combat.buffer_capacity must be at least 1".to_string(),
            ));
        }

        self.curves.validate()?;
        self.weapon.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_tuning_constants() {
        let config = CharacterConfig::default();
        assert_eq!(config.gait.stride_hertz, 1.5);
        assert_eq!(config.gait.step_length_ratio, 2.5);
        assert_eq!(config.spring.stiffness, 500.0);
        assert_eq!(config.spring.damp_ratio, 0.5);
        assert_eq!(config.combat.buffer_capacity, 5);
        assert_eq!(config.combat.buffer_max_age, 0.5);
        assert_eq!(config.torso.lean_ratio, 0.45);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = CharacterConfig::from_ron_str("(gait: (stride_hertz: 2.0))").unwrap();
        assert_eq!(config.gait.stride_hertz, 2.0);
        assert_eq!(config.gait.step_height_ratio, 0.5);
        assert_eq!(config.weapon.name, "Fists");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = CharacterConfig::from_ron_str("(locomotion: (run_speed: 0.0))").unwrap_err();
        assert!(matches!(err, LimbicError::InvalidConfig(_)));
        let err = CharacterConfig::from_ron_str("(combat: (buffer_capacity: 0))").unwrap_err();
        assert!(matches!(err, LimbicError::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_error_surfaces() {
        assert!(matches!(
            CharacterConfig::from_ron_str("(gait: 12"),
            Err(LimbicError::Parse(_))
        ));
    }

    #[test]
    fn test_cadence_modes() {
        let mut gait = GaitConfig::default();
        assert_eq!(gait.cadence(0.0, 0.0), 1.5);
        gait.speed_synced = true;
        assert_eq!(gait.cadence(0.0, 0.0), 0.0);
        assert!(gait.cadence(5.0, 0.0).is_finite());
        assert!((gait.cadence(2.0, 0.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = CharacterConfig::load_or_default(Path::new("/nonexistent/limbic.ron"));
        assert_eq!(config, CharacterConfig::default());
    }
}
