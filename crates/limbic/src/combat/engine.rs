//! # Combat Engine
//!
//! Explicit state machine that plays buffered attacks one strike at a time.
//!
//! ## Phases
//!
//! ```text
//! Idle --(buffered press)--> Prepping(0) --> Striking(i) --> Settling(i)
//!   Settling(i) --(same attack buffered, i+1 exists)--> Prepping(i+1)
//!   Settling(i) --(otherwise)--> ComboCooldown --> Idle
//! ```
//!
//! [`CombatEngine::tick`] runs once per frame and makes at most one phase
//! transition; time left over in a finished phase carries into the next one.
//! The weapon hand is driven exactly (snapped every tick); the off hand and
//! torso ease toward their poses with the limb's normal smoothing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CombatConfig;
use crate::limb::LimbController;
use crate::math::{Pose, EPSILON};

use super::attack::AttackLevel;
use super::buffer::InputBuffer;
use super::strike::{Strike, StrikePath};
use super::weapon::Weapon;

// ============================================================================
// Phases and events
// ============================================================================

/// Where the engine is in a strike sequence
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum CombatPhase {
    #[default]
    Idle,
    Prepping {
        level: AttackLevel,
        index: usize,
        elapsed: f32,
        /// Weapon-hand pose when the wind-up began
        from: Pose,
    },
    Striking {
        level: AttackLevel,
        index: usize,
        elapsed: f32,
    },
    Settling {
        level: AttackLevel,
        index: usize,
        elapsed: f32,
    },
    ComboCooldown {
        level: AttackLevel,
        elapsed: f32,
    },
}

impl CombatPhase {
    /// The strike sequence owns the weapon hand, off hand and torso
    pub fn is_attacking(&self) -> bool {
        matches!(
            self,
            CombatPhase::Prepping { .. } | CombatPhase::Striking { .. } | CombatPhase::Settling { .. }
        )
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, CombatPhase::Idle)
    }

    /// Strike index for phases that have one
    pub fn strike_index(&self) -> Option<usize> {
        match *self {
            CombatPhase::Prepping { index, .. }
            | CombatPhase::Striking { index, .. }
            | CombatPhase::Settling { index, .. } => Some(index),
            _ => None,
        }
    }
}

/// Phase transitions reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEvent {
    AttackStarted { level: AttackLevel },
    StrikeStarted { level: AttackLevel, index: usize },
    StrikeLanded { level: AttackLevel, index: usize },
    ComboContinued { level: AttackLevel, index: usize },
    ComboEnded { level: AttackLevel },
    Ready,
    Interrupted,
}

/// Limbs a strike writes to
pub struct StrikeLimbs<'a> {
    pub major: &'a mut LimbController,
    pub minor: Option<&'a mut LimbController>,
    pub torso: Option<&'a mut LimbController>,
}

impl StrikeLimbs<'_> {
    /// Ease the off hand and torso toward one end of their paths
    fn ease(&mut self, strike: &Strike, pick: fn(&StrikePath) -> Pose, dt: f32) {
        let followers = [
            (self.minor.as_deref_mut(), strike.minor),
            (self.torso.as_deref_mut(), strike.torso),
        ];
        for (limb, path) in followers {
            if let (Some(limb), Some(path)) = (limb, path) {
                let pose = pick(&path);
                limb.place_target(pose.position, Some(pose.rotation), dt);
            }
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Strike sequencer plus its input buffer (one per weapon)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatEngine {
    phase: CombatPhase,
    buffer: InputBuffer<AttackLevel>,
}

impl CombatEngine {
    pub fn new(config: &CombatConfig) -> Self {
        Self {
            phase: CombatPhase::Idle,
            buffer: InputBuffer::from_config(config),
        }
    }

    pub fn phase(&self) -> CombatPhase {
        self.phase
    }

    pub fn is_attacking(&self) -> bool {
        self.phase.is_attacking()
    }

    pub fn buffer(&self) -> &InputBuffer<AttackLevel> {
        &self.buffer
    }

    /// Queue a press; false if the buffer was full
    pub fn request(&mut self, level: AttackLevel, now: f32) -> bool {
        self.buffer.add(level, now)
    }

    /// Drop to idle immediately, keeping limbs where they are.
    ///
    /// Safe to call in any phase, any number of times.
    pub fn interrupt(&mut self) -> Option<CombatEvent> {
        self.buffer.clear();
        if self.phase.is_idle() {
            return None;
        }
        debug!("Combat interrupted in {:?}", self.phase);
        self.phase = CombatPhase::Idle;
        Some(CombatEvent::Interrupted)
    }

    /// Advance one frame
    pub fn tick(&mut self, weapon: &Weapon, mut limbs: StrikeLimbs<'_>, now: f32, dt: f32) -> Option<CombatEvent> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        match self.phase {
            CombatPhase::Idle => {
                let level = self.buffer.pop(now)?;
                if weapon.attack(level).is_empty() {
                    return None;
                }
                self.phase = CombatPhase::Prepping {
                    level,
                    index: 0,
                    elapsed: 0.0,
                    from: limbs.major.target(),
                };
                debug!("Attack {:?} started", level);
                Some(CombatEvent::AttackStarted { level })
            }

            CombatPhase::Prepping { level, index, elapsed, from } => {
                let Some(strike) = weapon.attack(level).strike(index) else {
                    return self.end_combo(level);
                };
                let elapsed = elapsed + dt;
                let progress = (elapsed / strike.prep.max(EPSILON)).min(1.0);
                limbs.major.snap_pose(from.lerp(&strike.major.start, progress));
                limbs.ease(strike, |path| path.start, dt);

                if elapsed >= strike.prep {
                    self.phase = CombatPhase::Striking {
                        level,
                        index,
                        elapsed: elapsed - strike.prep,
                    };
                    debug!("Strike {} '{}' swinging", index, strike.name);
                    Some(CombatEvent::StrikeStarted { level, index })
                } else {
                    self.phase = CombatPhase::Prepping { level, index, elapsed, from };
                    None
                }
            }

            CombatPhase::Striking { level, index, elapsed } => {
                let Some(strike) = weapon.attack(level).strike(index) else {
                    return self.end_combo(level);
                };
                let elapsed = elapsed + dt;
                limbs.ease(strike, |path| path.end, dt);

                if elapsed >= strike.duration {
                    // Land exactly on the end pose
                    limbs.major.snap_pose(strike.major.end);
                    self.phase = CombatPhase::Settling {
                        level,
                        index,
                        elapsed: elapsed - strike.duration,
                    };
                    Some(CombatEvent::StrikeLanded { level, index })
                } else {
                    let progress = elapsed / strike.duration.max(EPSILON);
                    limbs.major.snap_pose(strike.major.start.lerp(&strike.major.end, progress));
                    self.phase = CombatPhase::Striking { level, index, elapsed };
                    None
                }
            }

            CombatPhase::Settling { level, index, elapsed } => {
                let attack = weapon.attack(level);
                let Some(strike) = attack.strike(index) else {
                    return self.end_combo(level);
                };
                let elapsed = elapsed + dt;
                limbs.ease(strike, |path| path.end, dt);

                if elapsed < strike.settle {
                    self.phase = CombatPhase::Settling { level, index, elapsed };
                    return None;
                }

                let next = index + 1;
                if next < attack.len() && self.buffer.peek(now) == Some(level) {
                    self.buffer.pop(now);
                    self.phase = CombatPhase::Prepping {
                        level,
                        index: next,
                        elapsed: elapsed - strike.settle,
                        from: limbs.major.target(),
                    };
                    debug!("Combo {:?} continues to strike {}", level, next);
                    Some(CombatEvent::ComboContinued { level, index: next })
                } else {
                    self.phase = CombatPhase::ComboCooldown {
                        level,
                        elapsed: elapsed - strike.settle,
                    };
                    debug!("Combo {:?} ended after strike {}", level, index);
                    Some(CombatEvent::ComboEnded { level })
                }
            }

            CombatPhase::ComboCooldown { level, elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= weapon.attack(level).combo_delay {
                    self.phase = CombatPhase::Idle;
                    Some(CombatEvent::Ready)
                } else {
                    self.phase = CombatPhase::ComboCooldown { level, elapsed };
                    None
                }
            }
        }
    }

    // Strike list changed under us (re-equip mid-sequence); wind down cleanly
    fn end_combo(&mut self, level: AttackLevel) -> Option<CombatEvent> {
        self.phase = CombatPhase::ComboCooldown { level, elapsed: 0.0 };
        Some(CombatEvent::ComboEnded { level })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::strike::StrikeLandmarks;
    use crate::combat::weapon::WeaponSpec;
    use crate::limb::{test_controller, LimbId, Side};

    const DT: f32 = 1.0 / 60.0;

    struct Rig {
        right: LimbController,
        left: LimbController,
        weapon: Weapon,
        engine: CombatEngine,
        now: f32,
    }

    impl Rig {
        fn new() -> Self {
            let right = test_controller(LimbId::RIGHT_ARM);
            let left = test_controller(LimbId::LEFT_ARM);
            let weapon = WeaponSpec::fists().resolve(
                &StrikeLandmarks {
                    major: right.landmarks(),
                    major_side: Side::Right,
                    minor: Some(left.landmarks()),
                    torso: None,
                },
                0.1,
            );
            Self {
                right,
                left,
                weapon,
                engine: CombatEngine::new(&CombatConfig::default()),
                now: 0.0,
            }
        }

        fn tick(&mut self) -> Option<CombatEvent> {
            self.now += DT;
            let limbs = StrikeLimbs {
                major: &mut self.right,
                minor: Some(&mut self.left),
                torso: None,
            };
            self.engine.tick(&self.weapon, limbs, self.now, DT)
        }

        fn run_until(&mut self, done: impl Fn(&CombatPhase) -> bool) {
            for _ in 0..1000 {
                if done(&self.engine.phase()) {
                    return;
                }
                self.tick();
            }
            panic!("phase never reached, stuck in {:?}", self.engine.phase());
        }
    }

    #[test]
    fn test_idle_without_input_stays_idle() {
        let mut rig = Rig::new();
        let before = rig.right.target();
        for _ in 0..10 {
            assert_eq!(rig.tick(), None);
        }
        assert!(rig.engine.phase().is_idle());
        assert_eq!(rig.right.target(), before);
    }

    #[test]
    fn test_phase_durations() {
        let mut rig = Rig::new();
        rig.engine.request(AttackLevel::Light, rig.now);
        assert_eq!(rig.tick(), Some(CombatEvent::AttackStarted { level: AttackLevel::Light }));

        let strike = rig.weapon.light.strikes[0].clone();
        let mut prep_ticks = 0;
        while matches!(rig.engine.phase(), CombatPhase::Prepping { .. }) {
            rig.tick();
            prep_ticks += 1;
        }
        let prep_time = prep_ticks as f32 * DT;
        assert!((prep_time - strike.prep).abs() <= DT + 1e-4, "prep took {prep_time}");

        let mut strike_ticks = 0;
        while matches!(rig.engine.phase(), CombatPhase::Striking { .. }) {
            rig.tick();
            strike_ticks += 1;
        }
        let strike_time = strike_ticks as f32 * DT;
        assert!((strike_time - strike.duration).abs() <= DT + 1e-4, "strike took {strike_time}");
        assert!(matches!(rig.engine.phase(), CombatPhase::Settling { index: 0, .. }));
        assert_eq!(rig.right.target(), strike.major.end);
    }

    #[test]
    fn test_prep_starts_from_current_pose() {
        let mut rig = Rig::new();
        let from = rig.right.target();
        rig.engine.request(AttackLevel::Special, rig.now);
        rig.tick();
        rig.tick();
        let strike = &rig.weapon.special.strikes[0];
        let expected = from.lerp(&strike.major.start, DT / strike.prep);
        assert!((rig.right.target().position - expected.position).length() < 1e-5);
    }

    #[test]
    fn test_combo_continues_without_cooldown() {
        let mut rig = Rig::new();
        rig.engine.request(AttackLevel::Light, rig.now);
        rig.tick();
        rig.engine.request(AttackLevel::Light, rig.now);

        let mut events = Vec::new();
        for _ in 0..40 {
            if let Some(event) = rig.tick() {
                events.push(event);
            }
            if matches!(rig.engine.phase(), CombatPhase::Prepping { index: 1, .. }) {
                break;
            }
        }
        assert!(events.contains(&CombatEvent::ComboContinued {
            level: AttackLevel::Light,
            index: 1
        }));
        assert!(!events.iter().any(|e| matches!(e, CombatEvent::ComboEnded { .. } | CombatEvent::Ready)));
    }

    #[test]
    fn test_different_attack_ends_combo_and_waits() {
        let mut rig = Rig::new();
        rig.engine.request(AttackLevel::Light, rig.now);
        rig.tick();
        rig.run_until(|p| matches!(p, CombatPhase::Settling { .. }));
        rig.engine.request(AttackLevel::Heavy, rig.now);
        rig.run_until(|p| matches!(p, CombatPhase::ComboCooldown { .. }));
        // The heavy press is still queued for after the cooldown
        assert_eq!(rig.engine.buffer().len(), 1);
    }

    #[test]
    fn test_cooldown_returns_to_idle() {
        let mut rig = Rig::new();
        rig.engine.request(AttackLevel::Special, rig.now);
        rig.run_until(|p| matches!(p, CombatPhase::ComboCooldown { .. }));
        let start = rig.now;
        rig.run_until(CombatPhase::is_idle);
        let waited = rig.now - start;
        assert!((waited - rig.weapon.special.combo_delay).abs() <= DT + 1e-4);
    }

    #[test]
    fn test_interrupt_from_every_phase() {
        let probes: [fn(&CombatPhase) -> bool; 4] = [
            |p| matches!(p, CombatPhase::Prepping { .. }),
            |p| matches!(p, CombatPhase::Striking { .. }),
            |p| matches!(p, CombatPhase::Settling { .. }),
            |p| matches!(p, CombatPhase::ComboCooldown { .. }),
        ];
        for probe in probes {
            let mut rig = Rig::new();
            rig.engine.request(AttackLevel::Special, rig.now);
            rig.run_until(probe);
            rig.engine.request(AttackLevel::Light, rig.now);
            let held = rig.right.target();
            assert_eq!(rig.engine.interrupt(), Some(CombatEvent::Interrupted));
            assert!(rig.engine.phase().is_idle());
            assert!(rig.engine.buffer().is_empty());
            // No snap-back
            assert_eq!(rig.right.target(), held);
            assert_eq!(rig.tick(), None);
            assert_eq!(rig.right.target(), held);
        }

        let mut rig = Rig::new();
        assert_eq!(rig.engine.interrupt(), None);
        assert_eq!(rig.engine.interrupt(), None);
    }
}
