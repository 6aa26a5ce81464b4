//! # Leg Gait
//!
//! Foot placement along a walk/run cycle, snapped to the ground by ray cast.
//!
//! ## Cycle
//!
//! Each leg samples the character's gait clock at its own phase offset (the
//! left leg of a pair runs half a cycle behind). The foot follows a step path
//! centred under the hip: `-cos` along the heading for stride, the `Foot`
//! curve for height. During stance the path dips below the ground, so the ray
//! cast finds a hit and the foot stays planted.
//!
//! ## Resolution
//!
//! 1. Airborne: reach for the ground hit if one is in range, otherwise tuck
//!    toward an air crouch.
//! 2. No hit while walking: the foot is mid-step, follow the path.
//! 3. No hit while standing: hold the last grounded point (or rest).
//! 4. Hit: plant the foot on the hit point.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::GaitConfig;
use crate::curves::CurveKey;
use crate::limb::{Frame, LimbController, LimbStrategy};
use crate::locomotion::Locomotion;
use crate::math::{
    euler_degrees, heading_yaw, smoothing_factor, wrap_unit, BodyAxes, NamedRotation, Quat, Vec3, TAU,
};
use crate::rig::GroundHit;

// ============================================================================
// Gait Clock
// ============================================================================

/// Shared cyclic progress driving every leg of one character
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GaitClock {
    progress: f32,
}

impl GaitClock {
    pub fn new(progress: f32) -> Self {
        Self {
            progress: wrap_unit(progress),
        }
    }

    /// Advance by `hertz * dt` cycles
    pub fn advance(&mut self, hertz: f32, dt: f32) {
        let step = hertz * dt;
        if step.is_finite() {
            self.progress = wrap_unit(self.progress + step);
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }
}

// ============================================================================
// Gait Sample
// ============================================================================

/// Foot state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GaitState {
    GroundedResting,
    GroundedStepping,
    Airborne,
}

/// What one leg did this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaitSample {
    /// This leg's phase, [0, 1)
    pub phase: f32,
    pub step_length: f32,
    pub step_height: f32,
    pub state: GaitState,
    /// Resolved foot placement, body frame
    pub foot: Vec3,
    /// Step-path offset from the foot's centre, body frame
    pub step_offset: Vec3,
    /// Ground contact found this tick, body frame
    pub ground: Option<GroundHit>,
}

// ============================================================================
// Leg Gait
// ============================================================================

/// Walk/run cycle strategy for one leg
#[derive(Debug, Clone)]
pub struct LegGait {
    config: GaitConfig,
    phase_offset: f32,
    last_placement: Option<Vec3>,
    last_grounded: Option<Vec3>,
}

impl LegGait {
    pub fn new(config: GaitConfig, phase_offset: f32) -> Self {
        Self {
            config,
            phase_offset: wrap_unit(phase_offset),
            last_placement: None,
            last_grounded: None,
        }
    }

    pub fn phase_offset(&self) -> f32 {
        self.phase_offset
    }

    /// Forget remembered foot placements
    pub fn reset(&mut self) {
        self.last_placement = None;
        self.last_grounded = None;
    }

    /// This leg's phase for a given clock value
    pub fn phase(&self, clock: f32) -> f32 {
        wrap_unit(clock + self.phase_offset)
    }

    pub fn max_step_length(&self, leg_length: f32) -> f32 {
        leg_length * self.config.step_length_ratio
    }

    pub fn max_step_height(&self, leg_length: f32) -> f32 {
        leg_length * self.config.step_height_ratio
    }

    /// Stride for the current speed; shorter when sidestepping
    pub fn step_length(&self, leg_length: f32, loco: &Locomotion) -> f32 {
        let forward = loco.forward_rush().abs().min(self.config.forward_bias_cap);
        self.max_step_length(leg_length) * loco.rush() * forward
    }

    pub fn step_height(&self, leg_length: f32, loco: &Locomotion) -> f32 {
        self.max_step_height(leg_length) * loco.rush()
    }

    /// Offset from the foot's centre at `phase`, turned onto the walk heading
    pub fn step_offset(&self, phase: f32, leg_length: f32, loco: &Locomotion, frame: &Frame<'_>) -> Vec3 {
        let stride = self.step_length(leg_length, loco) * -(phase * TAU).cos();
        let lift = self.step_height(leg_length, loco) * frame.curves.sample(CurveKey::Foot, phase);
        let path = BodyAxes::FORWARD * stride + BodyAxes::UP * lift;
        Quat::from_rotation_y(heading_yaw(loco.walk_velocity())) * path
    }

    /// Foot pitch: flat at rest, following the `FootRot` curve when running
    pub fn foot_rotation(&self, phase: f32, loco: &Locomotion, frame: &Frame<'_>) -> Quat {
        let progress = if loco.moving_forward() { phase } else { -phase };
        let pitch = frame.curves.sample(CurveKey::FootRot, progress);
        let run = euler_degrees(Vec3::new(pitch * 180.0, 0.0, 0.0));
        let rest = NamedRotation::FlatForward.quat();
        rest.lerp(run, loco.rush().clamp(0.0, 1.0))
    }

    /// Cast for ground under a candidate foot position (body frame in, body frame out)
    fn probe_ground(&self, limb: &LimbController, candidate: Vec3, frame: &Frame<'_>) -> Option<GroundHit> {
        let loco = frame.locomotion;
        let hip = limb.rig().root.position;
        let rest = limb.rest_target().position;

        let (origin, direction, distance) = if loco.is_walking() {
            let toward = candidate - hip;
            (hip, toward, toward.length())
        } else {
            // Straight down through the resting foot
            (
                Vec3::new(rest.x, hip.y, rest.z),
                -BodyAxes::UP,
                limb.length() * self.config.ground_probe_ratio,
            )
        };
        if direction.length_squared() <= f32::EPSILON || distance <= 0.0 {
            return None;
        }

        let body = loco.body;
        frame
            .ground
            .cast_ground(body.transform_point(origin), body.rotation * direction, distance)
            .map(|hit| GroundHit {
                point: body.inverse_transform_point(hit.point),
                normal: body.rotation.inverse() * hit.normal,
            })
    }

    fn resolve(&mut self, limb: &LimbController, candidate: Vec3, hit: Option<GroundHit>, frame: &Frame<'_>) -> (Vec3, GaitState) {
        let loco = frame.locomotion;
        let rest = limb.rest_target().position;
        let last = self.last_placement.unwrap_or(limb.target().position);

        if loco.airborne() {
            if let Some(hit) = hit {
                return (hit.point, GaitState::Airborne);
            }
            let air_crouch = rest + BodyAxes::UP * self.max_step_height(limb.length()) * 0.5;
            let t = smoothing_factor(self.config.air_crouch_rate, frame.dt);
            return (last.lerp(air_crouch, t), GaitState::Airborne);
        }

        match hit {
            Some(hit) => {
                self.last_grounded = Some(hit.point);
                (hit.point, GaitState::GroundedResting)
            }
            None if loco.is_walking() => (candidate, GaitState::GroundedStepping),
            None => (self.last_grounded.unwrap_or(rest), GaitState::GroundedResting),
        }
    }
}

impl LimbStrategy for LegGait {
    type Output = GaitSample;

    fn drive(&mut self, limb: &mut LimbController, frame: &Frame<'_>) -> GaitSample {
        let loco = frame.locomotion;
        let leg_length = limb.length();
        let phase = self.phase(frame.gait_clock);

        let rest = limb.rest_target().position;
        let centre = Vec3::new(rest.x, 0.0, 0.0);
        let step_offset = self.step_offset(phase, leg_length, loco, frame);
        let candidate = centre + step_offset;

        let hit = self.probe_ground(limb, candidate, frame);
        let (foot, state) = self.resolve(limb, candidate, hit, frame);

        let rotation = self.foot_rotation(phase, loco, frame);
        limb.place_target(foot, Some(rotation), frame.dt);
        self.last_placement = Some(foot);

        // Slide the knee hint with the foot so strafing doesn't twist the knee
        if let Some(hint_rest) = limb.rest_hint() {
            limb.set_hint(hint_rest + BodyAxes::RIGHT * (step_offset.x * 0.5));
        }

        let sample = GaitSample {
            phase,
            step_length: self.step_length(leg_length, loco),
            step_height: self.step_height(leg_length, loco),
            state,
            foot,
            step_offset,
            ground: hit,
        };
        trace!(limb = %limb.id(), phase, state = ?state, "gait");
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimContext;
    use crate::curves::CurveLibrary;
    use crate::landmarks::LandmarkBasis;
    use crate::limb::{LimbId, Side};
    use crate::config::PlacementConfig;
    use crate::math::Pose;
    use crate::rig::{FlatGround, LimbRig, NoGround, GroundQuery};

    fn leg(side: Side) -> LimbController {
        let x = 0.1 * side.sign();
        let rig = LimbRig {
            root: Pose::from_position(Vec3::new(x, 0.9, 0.0)),
            mid: Pose::from_position(Vec3::new(x, 0.45, 0.0)),
            tip: Pose::from_position(Vec3::new(x, 0.07, 0.0)),
            extents: Vec3::new(0.1, 0.9, 0.1),
        };
        let basis = LandmarkBasis {
            torso_root: Vec3::new(0.0, 0.9, 0.0),
            chest: Vec3::new(0.0, 1.3, 0.0),
            neck: Vec3::new(0.0, 1.5, 0.0),
            torso_width: 0.36,
            torso_depth: 0.22,
            torso_length: 0.42,
            limb_root: rig.root.position,
            limb_length: rig.length(),
            side: Some(side),
        };
        let mut limb = LimbController::new(LimbId::leg(side), rig, basis, PlacementConfig::default());
        let hint = limb.default_hint(0.2);
        limb.init_hint(hint);
        limb
    }

    fn running() -> Locomotion {
        let mut loco = Locomotion::default();
        loco.update(Vec3::new(0.0, 0.0, -5.0), Pose::IDENTITY, true, 0.0);
        loco
    }

    fn frame<'a>(ctx: &'a SimContext, loco: &'a Locomotion, ground: &'a dyn GroundQuery, curves: &'a CurveLibrary, clock: f32) -> Frame<'a> {
        Frame {
            ctx,
            locomotion: loco,
            ground,
            curves,
            dt: 1.0 / 60.0,
            gait_clock: clock,
            gait: &[],
            attacking: false,
        }
    }

    #[test]
    fn test_clock_wraps() {
        let mut clock = GaitClock::default();
        clock.advance(1.5, 1.0);
        assert!((clock.progress() - 0.5).abs() < 1e-6);
        clock.advance(f32::NAN, 1.0);
        assert!((clock.progress() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_step_offset_is_periodic() {
        let ctx = SimContext::default();
        let loco = running();
        let curves = CurveLibrary::builtin();
        let gait = LegGait::new(GaitConfig::default(), 0.0);
        let f = frame(&ctx, &loco, &NoGround, &curves, 0.0);
        for i in 0..20 {
            let p = i as f32 / 20.0;
            let a = gait.step_offset(p, 0.83, &loco, &f);
            let b = gait.step_offset(p + 1.0, 0.83, &loco, &f);
            assert!((a - b).length() < 1e-4, "phase {p}");
        }
    }

    #[test]
    fn test_stride_points_along_heading() {
        let ctx = SimContext::default();
        let curves = CurveLibrary::builtin();
        let gait = LegGait::new(GaitConfig::default(), 0.0);
        let mut loco = Locomotion::default();
        loco.update(Vec3::new(3.0, 0.0, -4.0), Pose::IDENTITY, true, 0.0);
        let f = frame(&ctx, &loco, &NoGround, &curves, 0.0);
        // Half a cycle in, the foot is at the front of the stride
        let front = gait.step_offset(0.5, 0.83, &loco, &f);
        let heading = Vec3::new(0.6, 0.0, -0.8);
        assert!((front.normalize() - heading).length() < 1e-4);
        assert!((front.length() - gait.step_length(0.83, &loco)).abs() < 1e-5);
    }

    #[test]
    fn test_stationary_foot_plants_on_ground() {
        let ctx = SimContext::default();
        let loco = Locomotion::default();
        let curves = CurveLibrary::builtin();
        let ground = FlatGround::new(0.0);
        let mut limb = leg(Side::Right);
        let mut gait = LegGait::new(GaitConfig::default(), 0.0);
        let f = frame(&ctx, &loco, &ground, &curves, 0.3);
        let sample = gait.drive(&mut limb, &f);
        assert_eq!(sample.state, GaitState::GroundedResting);
        assert!((sample.foot - Vec3::new(0.1, 0.0, 0.0)).length() < 1e-5);
        assert_eq!(sample.step_length, 0.0);
        assert_eq!(sample.step_height, 0.0);
    }

    #[test]
    fn test_walking_without_ground_follows_path() {
        let ctx = SimContext::default();
        let loco = running();
        let curves = CurveLibrary::builtin();
        let mut limb = leg(Side::Right);
        let mut gait = LegGait::new(GaitConfig::default(), 0.0);
        let f = frame(&ctx, &loco, &NoGround, &curves, 0.25);
        let sample = gait.drive(&mut limb, &f);
        assert_eq!(sample.state, GaitState::GroundedStepping);
        assert!((sample.foot - (Vec3::new(0.1, 0.0, 0.0) + sample.step_offset)).length() < 1e-5);
    }

    #[test]
    fn test_airborne_tucks_toward_crouch() {
        let ctx = SimContext::default();
        let mut loco = Locomotion::default();
        loco.update(Vec3::ZERO, Pose::IDENTITY, false, 1.0);
        assert!(loco.airborne());
        let curves = CurveLibrary::builtin();
        let mut limb = leg(Side::Left);
        let mut gait = LegGait::new(GaitConfig::default(), 0.5);
        let rest_y = limb.rest_target().position.y;
        let mut last = None;
        for _ in 0..120 {
            last = Some(gait.drive(&mut limb, &frame(&ctx, &loco, &NoGround, &curves, 0.0)));
        }
        let last = last.unwrap();
        assert_eq!(last.state, GaitState::Airborne);
        let crouch = rest_y + limb.length() * 0.5 * 0.5;
        assert!((last.foot.y - crouch).abs() < 1e-3);
    }

    #[test]
    fn test_partner_phase_offset() {
        let right = LegGait::new(GaitConfig::default(), 0.0);
        let left = LegGait::new(GaitConfig::default(), 0.5);
        for i in 0..10 {
            let clock = i as f32 * 0.13;
            let diff = wrap_unit(left.phase(clock) - right.phase(clock));
            assert!((diff - 0.5).abs() < 1e-5);
        }
    }
}
