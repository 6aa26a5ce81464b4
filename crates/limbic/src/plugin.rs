//! # Limbic Plugin
//!
//! Drives [`Character`]s from the Bevy schedule.
//!
//! ## Usage
//!
//! ```rust,ignore
//! App::new()
//!     .add_plugins(MinimalPlugins)
//!     .add_plugins(LimbicPlugin)
//!     .run();
//!
//! commands.spawn((CharacterAnimator::new(character), Locomotion::default()));
//! ```
//!
//! The game layer writes `Locomotion` each frame and sends `AttackRequest` /
//! `InterruptRequest` messages; combat phase changes come back as
//! `CombatMessage`s. IK targets are read from `CharacterAnimator`.

use bevy::prelude::*;

use crate::character::{Character, IkTargets, TickReport};
use crate::combat::{AttackLevel, CombatEvent};
use crate::context::SimContext;
use crate::locomotion::Locomotion;
use crate::rig::{FlatGround, GroundQuery, NoGround};

// ============================================================================
// Resources
// ============================================================================

/// Simulation context for the running session
#[derive(Resource, Debug, Clone, Default)]
pub struct SimClock {
    pub context: SimContext,
}

/// What feet are placed against
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub enum GroundSurface {
    /// Horizontal plane at a fixed height
    Flat(FlatGround),
    /// Nothing: characters are always mid-step or falling
    Void,
    /// Avian colliders on these layers
    #[cfg(feature = "physics")]
    Physics(avian3d::prelude::LayerMask),
}

impl Default for GroundSurface {
    fn default() -> Self {
        GroundSurface::Flat(FlatGround::default())
    }
}

// ============================================================================
// Components
// ============================================================================

/// Procedural animation state for one entity
#[derive(Component, Debug, Clone)]
pub struct CharacterAnimator {
    pub character: Character,
    /// What the last tick produced
    pub last_report: TickReport,
}

impl CharacterAnimator {
    pub fn new(character: Character) -> Self {
        Self {
            character,
            last_report: TickReport::default(),
        }
    }

    pub fn ik_targets(&self) -> IkTargets {
        self.character.ik_targets()
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Buffer an attack press on a character
#[derive(Message, Debug, Clone)]
pub struct AttackRequest {
    pub entity: Entity,
    pub level: AttackLevel,
}

/// Cancel a character's strike sequence (stagger, hit reaction, ...)
#[derive(Message, Debug, Clone)]
pub struct InterruptRequest {
    pub entity: Entity,
}

/// Combat phase change on a character
#[derive(Message, Debug, Clone)]
pub struct CombatMessage {
    pub entity: Entity,
    pub event: CombatEvent,
}

// ============================================================================
// Plugin
// ============================================================================

/// Registers the simulation clock, ground and per-frame character systems
pub struct LimbicPlugin;

impl Plugin for LimbicPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimClock>()
            .init_resource::<GroundSurface>()
            .add_message::<AttackRequest>()
            .add_message::<InterruptRequest>()
            .add_message::<CombatMessage>()
            .add_systems(
                Update,
                (
                    advance_sim_clock,
                    queue_attack_requests,
                    apply_interrupts,
                    tick_characters,
                )
                    .chain(),
            );

        tracing::info!("LimbicPlugin initialized");
    }
}

// ============================================================================
// Systems
// ============================================================================

fn advance_sim_clock(time: Res<Time>, mut clock: ResMut<SimClock>) {
    clock.context.advance(time.delta_secs());
}

fn queue_attack_requests(
    mut requests: MessageReader<AttackRequest>,
    clock: Res<SimClock>,
    mut animators: Query<&mut CharacterAnimator>,
) {
    for request in requests.read() {
        match animators.get_mut(request.entity) {
            Ok(mut animator) => {
                animator.character.request_attack(request.level, clock.context.time);
            }
            Err(_) => tracing::warn!("Attack request for {:?}, which has no CharacterAnimator", request.entity),
        }
    }
}

fn apply_interrupts(
    mut requests: MessageReader<InterruptRequest>,
    mut animators: Query<&mut CharacterAnimator>,
    mut combat: MessageWriter<CombatMessage>,
) {
    for request in requests.read() {
        let Ok(mut animator) = animators.get_mut(request.entity) else {
            continue;
        };
        if let Some(event) = animator.character.interrupt() {
            combat.write(CombatMessage {
                entity: request.entity,
                event,
            });
        }
    }
}

#[cfg(not(feature = "physics"))]
fn tick_characters(
    time: Res<Time>,
    clock: Res<SimClock>,
    ground: Res<GroundSurface>,
    mut animators: Query<(Entity, &mut CharacterAnimator, &Locomotion)>,
    mut combat: MessageWriter<CombatMessage>,
) {
    match *ground {
        GroundSurface::Flat(flat) => tick_all(&flat, time.delta_secs(), &clock, &mut animators, &mut combat),
        GroundSurface::Void => tick_all(&NoGround, time.delta_secs(), &clock, &mut animators, &mut combat),
    }
}

#[cfg(feature = "physics")]
fn tick_characters(
    time: Res<Time>,
    clock: Res<SimClock>,
    ground: Res<GroundSurface>,
    spatial: avian3d::prelude::SpatialQuery,
    mut animators: Query<(Entity, &mut CharacterAnimator, &Locomotion)>,
    mut combat: MessageWriter<CombatMessage>,
) {
    let dt = time.delta_secs();
    match *ground {
        GroundSurface::Flat(flat) => tick_all(&flat, dt, &clock, &mut animators, &mut combat),
        GroundSurface::Void => tick_all(&NoGround, dt, &clock, &mut animators, &mut combat),
        GroundSurface::Physics(layers) => {
            let query = crate::rig::SpatialGround::new(&spatial, layers);
            tick_all(&query, dt, &clock, &mut animators, &mut combat);
        }
    }
}

fn tick_all(
    ground: &dyn GroundQuery,
    dt: f32,
    clock: &SimClock,
    animators: &mut Query<(Entity, &mut CharacterAnimator, &Locomotion)>,
    combat: &mut MessageWriter<CombatMessage>,
) {
    for (entity, mut animator, locomotion) in animators.iter_mut() {
        let report = animator.character.tick(&clock.context, locomotion, ground, dt);
        if let Some(event) = report.combat {
            combat.write(CombatMessage { entity, event });
        }
        animator.last_report = report;
    }
}
