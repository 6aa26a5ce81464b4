//! # Character
//!
//! Owns every limb of one procedurally animated character and runs them in
//! dependency order each tick.
//!
//! ## Building
//!
//! [`CharacterBuilder::build`] runs four explicit phases and fails fast on
//! anything a tick would otherwise have to paper over:
//!
//! 1. `build_skeleton_refs`: validate joint chains, pull out limb rigs
//! 2. `build_landmarks`: one controller per limb with its landmark table
//! 3. `build_strategy`: pair each controller with its gait/pump/sway strategy
//! 4. `finalize_pose`: hints, springs, shoulder anchors, flat feet, weapon
//!
//! ## Tick order
//!
//! gait clock → legs → arms → torso → shoulder re-anchor → combat → springs.
//! Arms read this tick's leg phases and follow this tick's chest.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::arm::{ArmBehavior, ArmPump};
use crate::combat::{
    AttackLevel, CombatEngine, CombatEvent, CombatPhase, StrikeLandmarks, StrikeLimbs, Weapon, WeaponSpec,
};
use crate::config::CharacterConfig;
use crate::context::SimContext;
use crate::error::{LimbicError, Result};
use crate::gait::{GaitClock, GaitSample, LegGait};
use crate::landmarks::LandmarkBasis;
use crate::limb::{Frame, LandmarkPin, Limb, LimbController, LimbId, LimbKind, Side};
use crate::locomotion::Locomotion;
use crate::math::{NamedRotation, Pose, Vec3};
use crate::rig::{GroundQuery, HumanoidBone, LimbRig, Skeleton};
use crate::spring::LimbSpring;
use crate::torso::{TorsoSample, TorsoSway};

// ============================================================================
// IK output
// ============================================================================

/// What the IK solver reads for one limb
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IkTarget {
    pub id: LimbId,
    /// Current root joint pose
    pub root: Pose,
    /// Pose the tip should reach (spring-filtered when a spring is attached)
    pub target: Pose,
    /// Pole for the mid joint
    pub hint: Option<Vec3>,
}

/// Every IK target of one character, body frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IkTargets {
    pub limbs: Vec<IkTarget>,
    pub head: Pose,
    pub hips: Vec3,
}

impl IkTargets {
    pub fn get(&self, id: LimbId) -> Option<&IkTarget> {
        self.limbs.iter().find(|t| t.id == id)
    }
}

/// Everything one tick produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub gait: Vec<(LimbId, GaitSample)>,
    pub arms: Vec<(LimbId, ArmBehavior)>,
    pub torso: Option<TorsoSample>,
    pub combat: Option<CombatEvent>,
}

// ============================================================================
// Builder
// ============================================================================

/// Joints pulled out of the skeleton for each limb
#[derive(Debug, Clone)]
pub struct SkeletonRefs {
    pub torso: LimbRig,
    pub neck: Pose,
    pub head: Pose,
    /// Hips to neck along the spine
    pub torso_length: f32,
    pub arms: Vec<(Side, LimbRig)>,
    pub legs: Vec<(Side, LimbRig)>,
}

/// Controllers with landmarks, before strategies are attached
#[derive(Debug, Clone)]
pub struct LimbControllers {
    pub torso: LimbController,
    pub head_rest: Pose,
    pub arms: Vec<LimbController>,
    pub legs: Vec<LimbController>,
}

/// Ordered setup for a [`Character`]
#[derive(Debug, Clone)]
pub struct CharacterBuilder {
    config: CharacterConfig,
    skeleton: Skeleton,
}

impl CharacterBuilder {
    /// Builder over the reference humanoid for `config.dimensions`
    pub fn new(config: CharacterConfig) -> Self {
        let skeleton = Skeleton::humanoid(&config.dimensions);
        Self { config, skeleton }
    }

    pub fn with_skeleton(mut self, skeleton: Skeleton) -> Self {
        self.skeleton = skeleton;
        self
    }

    pub fn config(&self) -> &CharacterConfig {
        &self.config
    }

    /// Run every phase in order
    pub fn build(self) -> Result<Character> {
        self.config.validate()?;
        let refs = self.build_skeleton_refs()?;
        let controllers = self.build_landmarks(&refs);
        let mut character = self.build_strategy(controllers)?;
        character.finalize_pose()?;
        info!(
            "Built character: {} legs, {} arms, weapon '{}'",
            character.legs.len(),
            character.arms.iter().flatten().count(),
            character.weapon.name
        );
        Ok(character)
    }

    /// Validate joint chains and extract limb rigs
    pub fn build_skeleton_refs(&self) -> Result<SkeletonRefs> {
        use HumanoidBone::*;

        let skeleton = &self.skeleton;
        let dims = &self.config.dimensions;
        skeleton.validate()?;

        if skeleton.index_of(Hips.name()).is_err() || skeleton.index_of(Chest.name()).is_err() {
            return Err(LimbicError::MissingLimb(LimbId::TORSO));
        }
        let torso = skeleton.limb_rig(
            Hips.name(),
            Spine.name(),
            Chest.name(),
            Vec3::new(dims.torso_width, dims.torso_length, dims.torso_depth),
        )?;
        skeleton.chain(Hips.name(), Head.name())?;
        let neck = skeleton.joint(Neck.name())?.pose();
        let head = skeleton.joint(Head.name())?.pose();
        let torso_length = skeleton.chain_length(Hips.name(), Neck.name())?;

        let arm_extents = Vec3::new(dims.arm_length, dims.limb_thickness, dims.limb_thickness);
        let leg_extents = Vec3::new(dims.limb_thickness, dims.leg_length, dims.limb_thickness);

        let mut arms = Vec::new();
        let mut legs = Vec::new();
        for side in [Side::Left, Side::Right] {
            let (upper_arm, lower_arm, hand) = match side {
                Side::Left => (LeftUpperArm, LeftLowerArm, LeftHand),
                Side::Right => (RightUpperArm, RightLowerArm, RightHand),
            };
            if let Some(rig) = self.optional_rig(upper_arm, lower_arm, hand, arm_extents)? {
                arms.push((side, rig));
            }

            let (upper_leg, lower_leg, foot) = match side {
                Side::Left => (LeftUpperLeg, LeftLowerLeg, LeftFoot),
                Side::Right => (RightUpperLeg, RightLowerLeg, RightFoot),
            };
            if let Some(rig) = self.optional_rig(upper_leg, lower_leg, foot, leg_extents)? {
                legs.push((side, rig));
            }
        }

        debug!("Skeleton refs: {} arms, {} legs", arms.len(), legs.len());
        Ok(SkeletonRefs {
            torso,
            neck,
            head,
            torso_length,
            arms,
            legs,
        })
    }

    // An absent limb is fine; a present one with a broken chain is not
    fn optional_rig(&self, root: HumanoidBone, mid: HumanoidBone, tip: HumanoidBone, extents: Vec3) -> Result<Option<LimbRig>> {
        if self.skeleton.index_of(root.name()).is_err() {
            return Ok(None);
        }
        self.skeleton
            .limb_rig(root.name(), mid.name(), tip.name(), extents)
            .map(Some)
    }

    /// One controller per limb, landmarks measured against the torso
    pub fn build_landmarks(&self, refs: &SkeletonRefs) -> LimbControllers {
        let dims = &self.config.dimensions;
        let placement = &self.config.placement;
        let basis = |rig: &LimbRig, side: Option<Side>| LandmarkBasis {
            torso_root: refs.torso.root.position,
            chest: refs.torso.tip.position,
            neck: refs.neck.position,
            torso_width: dims.torso_width,
            torso_depth: dims.torso_depth,
            torso_length: refs.torso_length,
            limb_root: rig.root.position,
            limb_length: rig.length(),
            side,
        };

        let torso = LimbController::new(LimbId::TORSO, refs.torso, basis(&refs.torso, None), placement.clone());
        let arms = refs
            .arms
            .iter()
            .map(|(side, rig)| LimbController::new(LimbId::arm(*side), *rig, basis(rig, Some(*side)), placement.clone()))
            .collect();
        let legs = refs
            .legs
            .iter()
            .map(|(side, rig)| LimbController::new(LimbId::leg(*side), *rig, basis(rig, Some(*side)), placement.clone()))
            .collect();

        LimbControllers {
            torso,
            head_rest: refs.head,
            arms,
            legs,
        }
    }

    /// Attach strategies; the left leg of a pair runs half a cycle behind
    pub fn build_strategy(&self, controllers: LimbControllers) -> Result<Character> {
        let config = &self.config;
        config.curves.validate()?;

        let paired = controllers.legs.len() > 1;
        let legs = controllers
            .legs
            .into_iter()
            .map(|limb| {
                let offset = if paired && limb.is_left() { 0.5 } else { 0.0 };
                Limb::new(limb, LegGait::new(config.gait.clone(), offset))
            })
            .collect();

        let mut arms: [Option<Limb<ArmPump>>; 2] = [None, None];
        for limb in controllers.arms {
            let index = limb.side().index();
            arms[index] = Some(Limb::new(limb, ArmPump::new(config.arm.clone())));
        }

        let torso = Limb::new(
            controllers.torso,
            TorsoSway::new(config.torso.clone(), controllers.head_rest),
        );

        let major_side = config.combat.major_side;
        let weapon = resolve_weapon(&config.weapon, &arms, &torso, major_side, config.combat.settle_fraction)?;

        Ok(Character {
            config: config.clone(),
            clock: GaitClock::default(),
            legs,
            arms,
            torso,
            weapon,
            combat: CombatEngine::new(&config.combat),
        })
    }
}

fn resolve_weapon(
    spec: &WeaponSpec,
    arms: &[Option<Limb<ArmPump>>; 2],
    torso: &Limb<TorsoSway>,
    major_side: Side,
    settle_fraction: f32,
) -> Result<Weapon> {
    spec.validate()?;
    let major = arms[major_side.index()]
        .as_ref()
        .ok_or(LimbicError::MissingLimb(LimbId::arm(major_side)))?;
    let minor = arms[major_side.opposite().index()].as_ref();
    let landmarks = StrikeLandmarks {
        major: major.controller.landmarks(),
        major_side,
        minor: minor.map(|limb| limb.controller.landmarks()),
        torso: Some(torso.controller.landmarks()),
    };
    Ok(spec.resolve(&landmarks, settle_fraction))
}

// ============================================================================
// Character
// ============================================================================

/// One animated character: limbs, gait clock, weapon and combo engine
#[derive(Debug, Clone)]
pub struct Character {
    config: CharacterConfig,
    clock: GaitClock,
    legs: Vec<Limb<LegGait>>,
    /// Indexed by side (left, right)
    arms: [Option<Limb<ArmPump>>; 2],
    torso: Limb<TorsoSway>,
    weapon: Weapon,
    combat: CombatEngine,
}

impl Character {
    /// Build with default tuning on the reference humanoid
    pub fn humanoid(config: CharacterConfig) -> Result<Self> {
        CharacterBuilder::new(config).build()
    }

    /// Hints, springs, anchors and flat feet
    fn finalize_pose(&mut self) -> Result<()> {
        if self.legs.is_empty() {
            return Err(LimbicError::MissingLimb(LimbId::leg(Side::Right)));
        }
        let chest_rest = self.torso.controller.rest_target();

        for leg in &mut self.legs {
            let limb = &mut leg.controller;
            let hint = limb.default_hint(self.config.gait.hint_forward_ratio);
            limb.init_hint(hint);
            let foot = limb.rest_target().position;
            limb.set_rest_target(Pose::new(foot, NamedRotation::FlatForward.quat()));
        }

        for arm in self.arms.iter_mut().flatten() {
            let hint = arm.strategy.rest_hint(&arm.controller);
            arm.controller.init_hint(hint);
            arm.controller.capture_anchor(chest_rest);
            if self.config.spring.enabled {
                let spring = LimbSpring::new(&self.config.spring, arm.controller.target());
                arm.controller.attach_spring(spring);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &CharacterConfig {
        &self.config
    }

    pub fn gait_clock(&self) -> f32 {
        self.clock.progress()
    }

    pub fn weapon(&self) -> &Weapon {
        &self.weapon
    }

    pub fn combat(&self) -> &CombatEngine {
        &self.combat
    }

    pub fn combat_phase(&self) -> CombatPhase {
        self.combat.phase()
    }

    pub fn is_attacking(&self) -> bool {
        self.combat.is_attacking()
    }

    pub fn legs(&self) -> impl Iterator<Item = &Limb<LegGait>> {
        self.legs.iter()
    }

    pub fn arm(&self, side: Side) -> Option<&Limb<ArmPump>> {
        self.arms[side.index()].as_ref()
    }

    pub fn torso(&self) -> &Limb<TorsoSway> {
        &self.torso
    }

    /// Controller for any limb
    pub fn limb(&self, id: LimbId) -> Option<&LimbController> {
        match (id.kind, id.side) {
            (LimbKind::Torso, _) => Some(&self.torso.controller),
            (LimbKind::Arm, Some(side)) => self.arm(side).map(|arm| &arm.controller),
            (LimbKind::Leg, Some(side)) => self
                .legs
                .iter()
                .find(|leg| leg.controller.side() == side)
                .map(|leg| &leg.controller),
            _ => None,
        }
    }

    fn limb_mut(&mut self, id: LimbId) -> Option<&mut LimbController> {
        match (id.kind, id.side) {
            (LimbKind::Torso, _) => Some(&mut self.torso.controller),
            (LimbKind::Arm, Some(side)) => self.arms[side.index()].as_mut().map(|arm| &mut arm.controller),
            (LimbKind::Leg, Some(side)) => self
                .legs
                .iter_mut()
                .find(|leg| leg.controller.side() == side)
                .map(|leg| &mut leg.controller),
            _ => None,
        }
    }

    /// Targets and hints for the IK solver
    pub fn ik_targets(&self) -> IkTargets {
        let target = |limb: &LimbController| IkTarget {
            id: limb.id(),
            root: limb.root(),
            target: limb.output(),
            hint: limb.hint(),
        };
        let mut limbs = Vec::with_capacity(self.legs.len() + 3);
        limbs.extend(self.legs.iter().map(|leg| target(&leg.controller)));
        limbs.extend(self.arms.iter().flatten().map(|arm| target(&arm.controller)));
        limbs.push(target(&self.torso.controller));

        IkTargets {
            limbs,
            head: self.torso.strategy.head(),
            hips: self.torso.controller.root().position,
        }
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Buffer an attack press
    pub fn request_attack(&mut self, level: AttackLevel, now: f32) -> bool {
        self.combat.request(level, now)
    }

    pub fn interrupt(&mut self) -> Option<CombatEvent> {
        self.combat.interrupt()
    }

    /// Swap weapons; any running combo is dropped
    pub fn equip(&mut self, spec: &WeaponSpec) -> Result<()> {
        let weapon = resolve_weapon(
            spec,
            &self.arms,
            &self.torso,
            self.config.combat.major_side,
            self.config.combat.settle_fraction,
        )?;
        self.combat.interrupt();
        info!("Equipped '{}'", weapon.name);
        self.weapon = weapon;
        self.config.weapon = spec.clone();
        Ok(())
    }

    /// Return every limb to rest and drop any combo, e.g. after a teleport
    pub fn reset_pose(&mut self) {
        self.combat.interrupt();
        self.clock = GaitClock::default();
        for leg in &mut self.legs {
            leg.strategy.reset();
            leg.controller.reset_to_rest();
        }
        for arm in self.arms.iter_mut().flatten() {
            arm.controller.reset_to_rest();
        }
        self.torso.controller.reset_to_rest();
        self.torso.strategy.reset_head();
        debug!("Pose reset");
    }

    /// Resize the torso's bounds.
    ///
    /// Every limb measures its landmarks against the torso, so all of them are
    /// recomputed and the weapon's strike poses resolved again.
    pub fn reset_torso_bounds(&mut self, extents: Vec3) -> Result<()> {
        if !extents.is_finite() || extents.min_element() <= 0.0 {
            return Err(LimbicError::InvalidConfig(format!(
                "torso bounds must be positive, got {extents}"
            )));
        }
        let rebased = |limb: &LimbController| LandmarkBasis {
            torso_width: extents.x,
            torso_depth: extents.z,
            ..*limb.landmarks().basis()
        };

        let basis = rebased(&self.torso.controller);
        self.torso.controller.reset_bounds(extents, basis);
        let limbs = self
            .legs
            .iter_mut()
            .map(|leg| &mut leg.controller)
            .chain(self.arms.iter_mut().flatten().map(|arm| &mut arm.controller));
        for limb in limbs {
            let basis = rebased(&*limb);
            let own = limb.rig().extents;
            limb.reset_bounds(own, basis);
        }

        self.config.dimensions.torso_width = extents.x;
        self.config.dimensions.torso_depth = extents.z;
        debug!("Torso bounds reset to {}", extents);

        let spec = self.config.weapon.clone();
        self.equip(&spec)
    }

    /// Hold a limb on a landmark for inspection
    pub fn pin(&mut self, id: LimbId, pin: LandmarkPin) -> Result<()> {
        let limb = self.limb_mut(id).ok_or(LimbicError::MissingLimb(id))?;
        debug!("Pinned {} to {:?}", id, pin.landmark);
        limb.pin(pin);
        Ok(())
    }

    pub fn unpin(&mut self, id: LimbId) -> Result<()> {
        self.limb_mut(id).ok_or(LimbicError::MissingLimb(id))?.unpin();
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Advance every limb by one frame
    pub fn tick(&mut self, ctx: &SimContext, locomotion: &Locomotion, ground: &dyn GroundQuery, dt: f32) -> TickReport {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut report = TickReport::default();

        if !ctx.dev_mode {
            self.drive_limbs(ctx, locomotion, ground, dt, &mut report);
            report.combat = self.drive_combat(ctx.time, dt);
        }

        // Springs keep relaxing even while the generators are frozen
        let body_velocity = locomotion.body.rotation.inverse() * locomotion.velocity;
        let body_velocity = if body_velocity.is_finite() { body_velocity } else { Vec3::ZERO };
        for arm in self.arms.iter_mut().flatten() {
            arm.controller.relax(body_velocity, dt);
        }

        report
    }

    fn drive_limbs(&mut self, ctx: &SimContext, locomotion: &Locomotion, ground: &dyn GroundQuery, dt: f32, report: &mut TickReport) {
        let step_length = self
            .legs
            .first()
            .map_or(0.0, |leg| leg.strategy.step_length(leg.controller.length(), locomotion));
        let hertz = self
            .config
            .gait
            .cadence(locomotion.walk_velocity().length(), step_length);
        self.clock.advance(hertz, dt);

        let attacking = self.combat.is_attacking();
        let mut frame = Frame {
            ctx,
            locomotion,
            ground,
            curves: &self.config.curves,
            dt,
            gait_clock: self.clock.progress(),
            gait: &[],
            attacking,
        };

        for leg in &mut self.legs {
            if let Some(sample) = leg.drive(&frame) {
                report.gait.push((leg.id(), sample));
            }
        }

        frame.gait = &report.gait;
        for arm in self.arms.iter_mut().flatten() {
            if let Some(behavior) = arm.drive(&frame) {
                report.arms.push((arm.id(), behavior));
            }
        }

        report.torso = self.torso.drive(&frame);

        // Shoulders ride on this tick's chest
        let chest = self.torso.controller.target();
        for arm in self.arms.iter_mut().flatten() {
            arm.controller.follow_anchor(chest);
        }
    }

    fn drive_combat(&mut self, now: f32, dt: f32) -> Option<CombatEvent> {
        let major_side = self.weapon.major_side;
        let [left, right] = &mut self.arms;
        let (major, minor) = match major_side {
            Side::Left => (left, right),
            Side::Right => (right, left),
        };
        let major = major.as_mut()?;
        let limbs = StrikeLimbs {
            major: &mut major.controller,
            minor: minor.as_mut().map(|limb| &mut limb.controller),
            torso: Some(&mut self.torso.controller),
        };
        self.combat.tick(&self.weapon, limbs, now, dt)
    }
}
