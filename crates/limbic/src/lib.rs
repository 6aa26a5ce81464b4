//! # Limbic
//!
//! Procedural locomotion and melee-strike animation core.
//!
//! Every tick the core writes an IK target (and an optional bend hint) for
//! each limb of a character; an external IK solver reads them. Nothing here
//! plays keyframed clips: feet, hands, torso and head are all placed from
//! landmarks, gait curves and the character's movement.
//!
//! ## Modules
//!
//! - [`landmarks`]: named, side-aware reference points on the body
//! - [`limb`]: the per-limb target/hint controller and the strategy seam
//! - [`spring`]: damped secondary motion for the visible targets
//! - [`gait`], [`arm`], [`torso`]: per-limb pose generators
//! - [`combat`]: strikes, weapons, buffered combos
//! - [`character`]: builder and per-tick orchestrator
//! - [`plugin`]: Bevy integration
//!
//! ## Frames
//!
//! All targets are in the character's body frame: right = +X, up = +Y,
//! forward = -Z, origin on the floor under the hips.

pub mod arm;
pub mod character;
pub mod combat;
pub mod config;
pub mod context;
pub mod curves;
pub mod error;
pub mod gait;
pub mod landmarks;
pub mod limb;
pub mod locomotion;
pub mod math;
pub mod plugin;
pub mod rig;
pub mod spring;
pub mod torso;

pub use arm::{ArmBehavior, ArmPump};
pub use character::{Character, CharacterBuilder, IkTarget, IkTargets, TickReport};
pub use combat::{AttackLevel, CombatEngine, CombatEvent, CombatPhase, Weapon, WeaponSpec};
pub use config::CharacterConfig;
pub use context::SimContext;
pub use curves::{Curve, CurveKey, CurveLibrary};
pub use error::{LimbicError, Result};
pub use gait::{GaitClock, GaitSample, GaitState, LegGait};
pub use landmarks::{LandmarkKind, Landmarks};
pub use limb::{LandmarkPin, Limb, LimbController, LimbId, LimbKind, LimbStrategy, Side};
pub use locomotion::Locomotion;
pub use math::{BodyAxes, NamedRotation, Pose, Quat, Vec3};
pub use plugin::{AttackRequest, CharacterAnimator, CombatMessage, GroundSurface, InterruptRequest, LimbicPlugin, SimClock};
pub use rig::{BodyDimensions, FlatGround, GroundHit, GroundQuery, NoGround, Skeleton};
pub use spring::LimbSpring;
pub use torso::{TorsoSample, TorsoSway};

/// Common imports
pub mod prelude {
    pub use crate::character::{Character, CharacterBuilder, IkTargets};
    pub use crate::combat::{AttackLevel, CombatEvent, WeaponSpec};
    pub use crate::config::CharacterConfig;
    pub use crate::context::SimContext;
    pub use crate::locomotion::Locomotion;
    pub use crate::math::{Pose, Quat, Vec3};
    pub use crate::plugin::{AttackRequest, CharacterAnimator, CombatMessage, InterruptRequest, LimbicPlugin};
    pub use crate::rig::{FlatGround, GroundQuery, NoGround};
}
