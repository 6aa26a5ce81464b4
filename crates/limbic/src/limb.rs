//! # Limb Pose Controller
//!
//! Shared state for every animated limb: the IK target the solver tracks,
//! the optional knee/elbow hint, an optional spring proxy, and the limb's
//! landmarks and measurements.
//!
//! ## Features
//!
//! - **Placement**: smoothed [`LimbController::place_target`] and immediate
//!   [`LimbController::snap_target`]
//! - **Strategies**: per-kind behaviour plugs in through [`LimbStrategy`]
//! - **Surrogate parenting**: arm roots follow the chest through a captured
//!   offset instead of a real hierarchy
//! - **Debug pin**: hold a limb on a named landmark for inspection

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::PlacementConfig;
use crate::context::SimContext;
use crate::curves::CurveLibrary;
use crate::gait::GaitSample;
use crate::landmarks::{LandmarkBasis, LandmarkKind, Landmarks};
use crate::locomotion::Locomotion;
use crate::math::{look_rotation, smoothing_factor, BodyAxes, NamedRotation, Pose, Quat, Vec3};
use crate::rig::{GroundQuery, LimbRig};
use crate::spring::LimbSpring;

// ============================================================================
// Identity
// ============================================================================

/// Which side of the body a limb hangs from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// -1 on the left, +1 on the right (along body right)
    pub fn sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn is_left(self) -> bool {
        self == Side::Left
    }

    /// Side of a point relative to the sagittal plane (zero counts as right)
    pub fn of(x: f32) -> Side {
        if x < 0.0 {
            Side::Left
        } else {
            Side::Right
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// Limb category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimbKind {
    Arm,
    Leg,
    Torso,
}

/// Kind plus side; unique within one character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LimbId {
    pub kind: LimbKind,
    pub side: Option<Side>,
}

impl LimbId {
    pub const LEFT_ARM: LimbId = LimbId::new(LimbKind::Arm, Some(Side::Left));
    pub const RIGHT_ARM: LimbId = LimbId::new(LimbKind::Arm, Some(Side::Right));
    pub const LEFT_LEG: LimbId = LimbId::new(LimbKind::Leg, Some(Side::Left));
    pub const RIGHT_LEG: LimbId = LimbId::new(LimbKind::Leg, Some(Side::Right));
    pub const TORSO: LimbId = LimbId::new(LimbKind::Torso, None);

    pub const fn new(kind: LimbKind, side: Option<Side>) -> Self {
        Self { kind, side }
    }

    pub const fn arm(side: Side) -> Self {
        Self::new(LimbKind::Arm, Some(side))
    }

    pub const fn leg(side: Side) -> Self {
        Self::new(LimbKind::Leg, Some(side))
    }
}

impl fmt::Display for LimbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.side {
            Some(side) => write!(f, "{:?} {:?}", side, self.kind),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

// ============================================================================
// Strategy seam
// ============================================================================

/// Per-tick inputs shared by every limb strategy
pub struct Frame<'a> {
    pub ctx: &'a SimContext,
    pub locomotion: &'a Locomotion,
    pub ground: &'a dyn GroundQuery,
    pub curves: &'a CurveLibrary,
    pub dt: f32,
    /// Character gait clock, [0, 1)
    pub gait_clock: f32,
    /// Leg samples already produced this tick
    pub gait: &'a [(LimbId, GaitSample)],
    /// A strike sequence owns the arms and torso this tick
    pub attacking: bool,
}

impl Frame<'_> {
    /// This tick's sample for the leg on `side`
    pub fn leg(&self, side: Side) -> Option<&GaitSample> {
        self.gait
            .iter()
            .find(|(id, _)| id.kind == LimbKind::Leg && id.side == Some(side))
            .map(|(_, sample)| sample)
    }

    /// This tick's first leg sample, if any
    pub fn any_leg(&self) -> Option<&GaitSample> {
        self.gait.first().map(|(_, sample)| sample)
    }

    pub fn leg_count(&self) -> usize {
        self.gait.len()
    }
}

/// Behaviour plugged into a [`LimbController`]
pub trait LimbStrategy {
    type Output;

    /// Compute and write this tick's target
    fn drive(&mut self, limb: &mut LimbController, frame: &Frame<'_>) -> Self::Output;
}

/// Controller plus its behaviour
#[derive(Debug, Clone)]
pub struct Limb<S> {
    pub controller: LimbController,
    pub strategy: S,
}

impl<S: LimbStrategy> Limb<S> {
    pub fn new(controller: LimbController, strategy: S) -> Self {
        Self { controller, strategy }
    }

    pub fn id(&self) -> LimbId {
        self.controller.id()
    }

    /// Drive the strategy unless the limb is pinned for preview
    pub fn drive(&mut self, frame: &Frame<'_>) -> Option<S::Output> {
        if self.controller.apply_pin(frame.dt) {
            return None;
        }
        Some(self.strategy.drive(&mut self.controller, frame))
    }
}

// ============================================================================
// Limb Controller
// ============================================================================

/// Debug preview: hold the limb on a landmark
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPin {
    pub landmark: LandmarkKind,
    pub rotation: Option<NamedRotation>,
}

/// Target/hint owner for one limb
#[derive(Debug, Clone)]
pub struct LimbController {
    id: LimbId,
    rig: LimbRig,
    landmarks: Landmarks,
    placement: PlacementConfig,
    /// Commanded IK target
    target: Pose,
    rest_target: Pose,
    /// Current root joint pose (moves when re-anchored)
    root: Pose,
    hint: Option<Vec3>,
    rest_hint: Option<Vec3>,
    spring: Option<LimbSpring>,
    anchor_offset: Option<Pose>,
    pin: Option<LandmarkPin>,
}

impl LimbController {
    pub fn new(id: LimbId, rig: LimbRig, basis: LandmarkBasis, placement: PlacementConfig) -> Self {
        let rest_target = rig.tip;
        Self {
            id,
            rig,
            landmarks: Landmarks::new(basis),
            placement,
            target: rest_target,
            rest_target,
            root: rig.root,
            hint: None,
            rest_hint: None,
            spring: None,
            anchor_offset: None,
            pin: None,
        }
    }

    // ------------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------------

    pub fn id(&self) -> LimbId {
        self.id
    }

    pub fn kind(&self) -> LimbKind {
        self.id.kind
    }

    /// Side from the id, else from the rest root's lateral sign
    pub fn side(&self) -> Side {
        self.id.side.unwrap_or_else(|| Side::of(self.rig.root.position.x))
    }

    pub fn is_left(&self) -> bool {
        self.side().is_left()
    }

    pub fn rig(&self) -> &LimbRig {
        &self.rig
    }

    /// Rest root-to-tip distance
    pub fn length(&self) -> f32 {
        self.rig.length()
    }

    pub fn width(&self) -> f32 {
        self.rig.extents.x
    }

    pub fn height(&self) -> f32 {
        self.rig.extents.y
    }

    pub fn depth(&self) -> f32 {
        self.rig.extents.z
    }

    pub fn landmarks(&self) -> &Landmarks {
        &self.landmarks
    }

    pub fn landmark(&self, kind: LandmarkKind) -> Vec3 {
        self.landmarks.get(kind, None)
    }

    /// Replace the mesh extents and rebuild landmarks from `basis`
    pub fn reset_bounds(&mut self, extents: Vec3, basis: LandmarkBasis) {
        self.rig.extents = extents;
        self.landmarks.rebase(basis);
    }

    // ------------------------------------------------------------------------
    // Target
    // ------------------------------------------------------------------------

    pub fn target(&self) -> Pose {
        self.target
    }

    pub fn rest_target(&self) -> Pose {
        self.rest_target
    }

    /// Override the rest target (e.g. flat feet instead of the bind pose)
    pub fn set_rest_target(&mut self, pose: Pose) {
        self.rest_target = pose;
        self.snap_target(pose.position, Some(pose.rotation));
        if let Some(spring) = self.spring.as_mut() {
            spring.reset(pose);
        }
    }

    /// Move toward `position` (and `rotation`) with exponential smoothing
    pub fn place_target(&mut self, position: Vec3, rotation: Option<Quat>, dt: f32) {
        let t = smoothing_factor(self.placement.position_rate, dt);
        self.target.position = self.target.position.lerp(position, t);
        if let Some(rotation) = rotation {
            self.place_rotation(rotation, dt);
        }
    }

    pub fn place_rotation(&mut self, rotation: Quat, dt: f32) {
        let t = smoothing_factor(self.placement.rotation_rate, dt);
        self.target.rotation = self.target.rotation.slerp(rotation, t).normalize();
    }

    /// Place with a look-at rotation
    pub fn place_looking(&mut self, position: Vec3, look: Vec3, dt: f32) {
        let rotation = self.look_rotation(look);
        self.place_target(position, Some(rotation), dt);
    }

    /// Rotation whose forward axis points along `look`
    pub fn look_rotation(&self, look: Vec3) -> Quat {
        look_rotation(look, BodyAxes::UP)
    }

    /// Set the target immediately
    pub fn snap_target(&mut self, position: Vec3, rotation: Option<Quat>) {
        self.target.position = position;
        if let Some(rotation) = rotation {
            self.target.rotation = rotation;
        }
    }

    pub fn snap_pose(&mut self, pose: Pose) {
        self.snap_target(pose.position, Some(pose.rotation));
    }

    /// Offset of the current target from rest
    pub fn target_offset(&self) -> Vec3 {
        self.rest_target.position - self.target.position
    }

    /// Back to the rest target, root and hint, with the spring settled there
    pub fn reset_to_rest(&mut self) {
        self.target = self.rest_target;
        self.root = self.rig.root;
        self.hint = self.rest_hint;
        if let Some(spring) = self.spring.as_mut() {
            spring.reset(self.rest_target);
        }
    }

    // ------------------------------------------------------------------------
    // Root
    // ------------------------------------------------------------------------

    pub fn root(&self) -> Pose {
        self.root
    }

    pub fn set_root_position(&mut self, position: Vec3) {
        self.root.position = position;
    }

    /// Remember the root's offset from `parent` so it can follow it later
    pub fn capture_anchor(&mut self, parent: Pose) {
        let inverse = parent.rotation.inverse();
        self.anchor_offset = Some(Pose::new(
            inverse * (self.root.position - parent.position),
            inverse * self.root.rotation,
        ));
    }

    /// Re-place the root relative to where `parent` is now
    pub fn follow_anchor(&mut self, parent: Pose) {
        let offset = *self.anchor_offset.get_or_insert_with(|| {
            let inverse = parent.rotation.inverse();
            Pose::new(
                inverse * (self.root.position - parent.position),
                inverse * self.root.rotation,
            )
        });
        self.root = Pose::new(
            parent.transform_point(offset.position),
            parent.rotation * offset.rotation,
        );
    }

    // ------------------------------------------------------------------------
    // Hint
    // ------------------------------------------------------------------------

    pub fn hint(&self) -> Option<Vec3> {
        self.hint
    }

    pub fn rest_hint(&self) -> Option<Vec3> {
        self.rest_hint
    }

    /// Set the hint and make it the new rest hint
    pub fn init_hint(&mut self, position: Vec3) {
        self.hint = Some(position);
        self.rest_hint = Some(position);
    }

    pub fn set_hint(&mut self, position: Vec3) {
        self.hint = Some(position);
    }

    /// Default knee/elbow hint: in front of the mid joint
    pub fn default_hint(&self, forward_ratio: f32) -> Vec3 {
        self.rig.mid.position + BodyAxes::FORWARD * forward_ratio * self.length()
    }

    // ------------------------------------------------------------------------
    // Spring
    // ------------------------------------------------------------------------

    pub fn attach_spring(&mut self, spring: LimbSpring) {
        self.spring = Some(spring);
    }

    pub fn spring(&self) -> Option<&LimbSpring> {
        self.spring.as_ref()
    }

    /// Advance the spring toward the commanded target
    pub fn relax(&mut self, body_velocity: Vec3, dt: f32) {
        let target = self.target;
        if let Some(spring) = self.spring.as_mut() {
            spring.step(target, body_velocity, dt);
        }
    }

    /// Pose the IK solver should track: the spring proxy if present
    pub fn output(&self) -> Pose {
        self.spring.as_ref().map_or(self.target, LimbSpring::output)
    }

    // ------------------------------------------------------------------------
    // Debug pin
    // ------------------------------------------------------------------------

    pub fn pin(&mut self, pin: LandmarkPin) {
        self.pin = Some(pin);
    }

    pub fn unpin(&mut self) {
        self.pin = None;
    }

    pub fn pinned(&self) -> Option<LandmarkPin> {
        self.pin
    }

    /// Hold the pinned pose; returns whether a pin is active
    pub fn apply_pin(&mut self, dt: f32) -> bool {
        let Some(pin) = self.pin else {
            return false;
        };
        let position = self.landmark(pin.landmark);
        self.place_target(position, pin.rotation.map(NamedRotation::quat), dt);
        true
    }
}


#[cfg(test)]
pub(crate) use tests::test_controller;
