//! # Combat
//!
//! Melee strikes, attacks, weapons and the buffered combo engine that plays
//! them on a character's hands and torso.
//!
//! ## Features
//!
//! - **Strikes**: landmark-addressed start/end poses with prep, swing and
//!   settle timing
//! - **Combos**: same-attack presses buffered during a strike chain into the
//!   next strike without a cooldown
//! - **Input buffer**: bounded, time-stamped FIFO that forgives early presses
//! - **Interrupt**: idempotent drop to idle that leaves limbs where they are

pub mod attack;
pub mod buffer;
pub mod engine;
pub mod strike;
pub mod weapon;

pub use attack::{Attack, AttackLevel, AttackSpec};
pub use buffer::{Buffered, InputBuffer};
pub use engine::{CombatEngine, CombatEvent, CombatPhase, StrikeLimbs};
pub use strike::{Orientation, Strike, StrikeLandmarks, StrikePath, StrikeSpec, TargetSpec};
pub use weapon::{Weapon, WeaponSpec};
