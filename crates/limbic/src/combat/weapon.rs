//! # Weapons
//!
//! A weapon is three attacks (light, heavy, special) plus the hand that
//! carries it. [`WeaponSpec`] is the serialisable description stored in
//! [`CharacterConfig`](crate::config::CharacterConfig); equipping resolves it
//! into a [`Weapon`] whose strike poses are fixed to one character's limbs.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::limb::Side;

use super::attack::{Attack, AttackLevel, AttackSpec};
use super::strike::{StrikeLandmarks, StrikeSpec};

/// Data description of a weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponSpec {
    pub name: String,
    pub light: AttackSpec,
    pub heavy: AttackSpec,
    pub special: AttackSpec,
}

impl Default for WeaponSpec {
    fn default() -> Self {
        Self::fists()
    }
}

impl WeaponSpec {
    /// Bare hands: jab-cross-jab, double haymaker, slow uppercut
    pub fn fists() -> Self {
        Self {
            name: "Fists".to_string(),
            light: AttackSpec::new(
                vec![StrikeSpec::jab(), StrikeSpec::cross(), StrikeSpec::jab()],
                0.5,
            ),
            heavy: AttackSpec::new(vec![StrikeSpec::haymaker(), StrikeSpec::haymaker()], 1.0),
            special: AttackSpec::new(vec![StrikeSpec::uppercut()], 1.0),
        }
    }

    pub fn attack(&self, level: AttackLevel) -> &AttackSpec {
        match level {
            AttackLevel::Light => &self.light,
            AttackLevel::Heavy => &self.heavy,
            AttackLevel::Special => &self.special,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for level in AttackLevel::ALL {
            self.attack(level).validate()?;
        }
        Ok(())
    }

    /// Fix every strike to the given limbs
    pub fn resolve(&self, limbs: &StrikeLandmarks<'_>, settle_fraction: f32) -> Weapon {
        Weapon {
            name: self.name.clone(),
            major_side: limbs.major_side,
            light: self.light.resolve(limbs, settle_fraction),
            heavy: self.heavy.resolve(limbs, settle_fraction),
            special: self.special.resolve(limbs, settle_fraction),
        }
    }
}

/// A weapon equipped on one character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    /// Hand holding the weapon
    pub major_side: Side,
    pub light: Attack,
    pub heavy: Attack,
    pub special: Attack,
}

impl Weapon {
    pub fn attack(&self, level: AttackLevel) -> &Attack {
        match level {
            AttackLevel::Light => &self.light,
            AttackLevel::Heavy => &self.heavy,
            AttackLevel::Special => &self.special,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fists_layout() {
        let fists = WeaponSpec::fists();
        assert_eq!(fists.name, "Fists");
        let light: Vec<_> = fists.light.strikes.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(light, ["Jab", "Cross", "Jab"]);
        assert_eq!(fists.light.combo_delay, 0.5);
        assert_eq!(fists.heavy.strikes.len(), 2);
        assert_eq!(fists.heavy.combo_delay, 1.0);
        assert_eq!(fists.special.strikes[0].name, "Uppercut");
        assert!(fists.validate().is_ok());
    }

    #[test]
    fn test_invalid_attack_fails_weapon() {
        let mut fists = WeaponSpec::fists();
        fists.special.strikes.clear();
        assert!(fists.validate().is_err());
    }
}
