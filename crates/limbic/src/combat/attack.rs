//! Attacks: ordered strike sequences that chain into combos.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{LimbicError, Result};

use super::strike::{Strike, StrikeLandmarks, StrikeSpec};

/// Which attack a press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackLevel {
    Light,
    Heavy,
    Special,
}

impl AttackLevel {
    pub const ALL: [AttackLevel; 3] = [AttackLevel::Light, AttackLevel::Heavy, AttackLevel::Special];

    pub fn name(self) -> &'static str {
        match self {
            AttackLevel::Light => "Light",
            AttackLevel::Heavy => "Heavy",
            AttackLevel::Special => "Special",
        }
    }
}

impl FromStr for AttackLevel {
    type Err = LimbicError;

    fn from_str(s: &str) -> Result<Self> {
        AttackLevel::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| LimbicError::UnknownAttack(s.to_string()))
    }
}

fn default_combo_delay() -> f32 { 0.5 }

/// Data description of an attack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackSpec {
    pub strikes: Vec<StrikeSpec>,
    /// Lockout after the sequence ends before the next attack may start
    #[serde(default = "default_combo_delay")]
    pub combo_delay: f32,
}

impl AttackSpec {
    pub fn new(strikes: Vec<StrikeSpec>, combo_delay: f32) -> Self {
        Self { strikes, combo_delay }
    }

    pub fn validate(&self) -> Result<()> {
        if self.strikes.is_empty() {
            return Err(LimbicError::InvalidConfig("attack has no strikes".to_string()));
        }
        if !self.combo_delay.is_finite() || self.combo_delay < 0.0 {
            return Err(LimbicError::InvalidConfig(format!(
                "combo_delay must not be negative, got {}",
                self.combo_delay
            )));
        }
        self.strikes.iter().try_for_each(StrikeSpec::validate)
    }

    pub fn resolve(&self, limbs: &StrikeLandmarks<'_>, settle_fraction: f32) -> Attack {
        Attack {
            strikes: self
                .strikes
                .iter()
                .map(|spec| spec.resolve(limbs, settle_fraction))
                .collect(),
            combo_delay: self.combo_delay,
        }
    }
}

/// An attack resolved for one character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attack {
    pub strikes: Vec<Strike>,
    pub combo_delay: f32,
}

impl Attack {
    pub fn strike(&self, index: usize) -> Option<&Strike> {
        self.strikes.get(index)
    }

    pub fn len(&self) -> usize {
        self.strikes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_attack_is_rejected() {
        let spec = AttackSpec::new(Vec::new(), 0.5);
        assert!(matches!(spec.validate(), Err(LimbicError::InvalidConfig(_))));
    }

    #[test]
    fn test_negative_delay_is_rejected() {
        let spec = AttackSpec::new(vec![StrikeSpec::jab()], -1.0);
        assert!(spec.validate().is_err());
        let spec = AttackSpec::new(vec![StrikeSpec::jab()], 0.0);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_parse_level() {
        assert_eq!("heavy".parse::<AttackLevel>(), Ok(AttackLevel::Heavy));
        assert_eq!(
            "kick".parse::<AttackLevel>(),
            Err(LimbicError::UnknownAttack("kick".into()))
        );
    }
}
