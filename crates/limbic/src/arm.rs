//! # Arm Pump
//!
//! Default arm behaviour when no weapon motion is playing.
//!
//! Priority, highest first: attacking (hands belong to the strike) >
//! guarding (fists by the face) > walking (pump in time with the opposite
//! leg) > resting (hands lowered).

use serde::{Deserialize, Serialize};

use crate::config::ArmConfig;
use crate::curves::CurveKey;
use crate::landmarks::LandmarkKind;
use crate::limb::{Frame, LimbController, LimbStrategy};
use crate::math::{heading_yaw, wrap_unit, BodyAxes, NamedRotation, Quat, Vec3};

/// Which behaviour an arm ran this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmBehavior {
    /// A strike owns the hand
    Suspended,
    Guarding,
    Pumping,
    Resting,
    /// Walking, but no opposite leg to keep time with
    Unpaired,
}

/// Arm strategy
#[derive(Debug, Clone)]
pub struct ArmPump {
    config: ArmConfig,
}

impl ArmPump {
    pub fn new(config: ArmConfig) -> Self {
        Self { config }
    }

    /// Elbow hint: behind and above the waist, since T-posed elbows bend back
    pub fn rest_hint(&self, limb: &LimbController) -> Vec3 {
        limb.landmark(LandmarkKind::Waist)
            + BodyAxes::FORWARD * (-self.config.hint_back_ratio * limb.depth())
            + BodyAxes::UP * (self.config.hint_up_ratio * limb.length())
    }

    fn rest(&self, limb: &mut LimbController, dt: f32) {
        let lowered = limb.landmark(LandmarkKind::Lowered);
        limb.place_target(lowered, Some(NamedRotation::Down.quat()), dt);
    }

    fn guard(&self, limb: &mut LimbController, dt: f32) {
        let face = limb.landmark(LandmarkKind::Face);
        let up = NamedRotation::up_for(limb.is_left()).quat();
        limb.place_target(face, Some(up), dt);
    }

    /// Pose for the pump cycle at `phase`; pure so it can be sampled
    pub fn pump_pose(&self, limb: &LimbController, phase: f32, frame: &Frame<'_>) -> (Vec3, Quat) {
        let loco = frame.locomotion;
        let rush = loco.rush().clamp(0.0, 1.0);
        let length = limb.length();

        let z = frame.curves.sample(CurveKey::HandZ, phase) * length;
        let y = frame.curves.sample(CurveKey::HandY, phase) * length;

        // Swing along the heading, but never further round than the limit
        let walk = loco.walk_velocity();
        let heading = if loco.moving_forward() { walk } else { -walk };
        let limit = self.config.pump_yaw_limit_degrees.to_radians();
        let yaw = heading_yaw(heading).clamp(-limit, limit);
        let swing = Quat::from_rotation_y(yaw) * (BodyAxes::FORWARD * z + BodyAxes::UP * y);

        let rest_pos = limb.landmark(LandmarkKind::Waist);
        let position = rest_pos.lerp(rest_pos + swing, rush);

        let down = NamedRotation::Down.quat();
        let forward = NamedRotation::Forward.quat();
        let blend = frame.curves.sample(CurveKey::HandRot, phase).clamp(0.0, 1.0);
        let run_rot = down.slerp(forward, blend);
        let rotation = down.lerp(run_rot, rush);

        (position, rotation)
    }

    fn pump(&self, limb: &mut LimbController, frame: &Frame<'_>) -> ArmBehavior {
        let Some(leg) = frame.leg(limb.side().opposite()) else {
            return ArmBehavior::Unpaired;
        };
        let mut phase = leg.phase;
        if !frame.locomotion.moving_forward() {
            phase = wrap_unit(phase + 0.5);
        }
        let (position, rotation) = self.pump_pose(limb, phase, frame);
        limb.place_target(position, Some(rotation), frame.dt);
        ArmBehavior::Pumping
    }
}

impl LimbStrategy for ArmPump {
    type Output = ArmBehavior;

    fn drive(&mut self, limb: &mut LimbController, frame: &Frame<'_>) -> ArmBehavior {
        let loco = frame.locomotion;
        if frame.attacking {
            ArmBehavior::Suspended
        } else if loco.guarding {
            self.guard(limb, frame.dt);
            ArmBehavior::Guarding
        } else if loco.is_walking() {
            self.pump(limb, frame)
        } else {
            self.rest(limb, frame.dt);
            ArmBehavior::Resting
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimContext;
    use crate::curves::CurveLibrary;
    use crate::gait::{GaitSample, GaitState};
    use crate::limb::{test_controller, LimbId};
    use crate::locomotion::Locomotion;
    use crate::math::Pose;
    use crate::rig::NoGround;

    fn sample(phase: f32) -> GaitSample {
        GaitSample {
            phase,
            step_length: 0.0,
            step_height: 0.0,
            state: GaitState::GroundedStepping,
            foot: Vec3::ZERO,
            step_offset: Vec3::ZERO,
            ground: None,
        }
    }

    fn drive(loco: &Locomotion, gait: &[(LimbId, GaitSample)], attacking: bool) -> (ArmBehavior, LimbController) {
        let ctx = SimContext::default();
        let curves = CurveLibrary::builtin();
        let frame = Frame {
            ctx: &ctx,
            locomotion: loco,
            ground: &NoGround,
            curves: &curves,
            dt: 1.0,
            gait_clock: 0.0,
            gait,
            attacking,
        };
        let mut limb = test_controller(LimbId::RIGHT_ARM);
        let behavior = ArmPump::new(ArmConfig::default()).drive(&mut limb, &frame);
        (behavior, limb)
    }

    #[test]
    fn test_priority_order() {
        let mut loco = Locomotion::default();
        loco.guarding = true;
        assert_eq!(drive(&loco, &[], true).0, ArmBehavior::Suspended);
        assert_eq!(drive(&loco, &[], false).0, ArmBehavior::Guarding);
        loco.guarding = false;
        assert_eq!(drive(&loco, &[], false).0, ArmBehavior::Resting);
        loco.update(Vec3::new(0.0, 0.0, -3.0), Pose::IDENTITY, true, 0.0);
        assert_eq!(drive(&loco, &[], false).0, ArmBehavior::Unpaired);
        let gait = [(LimbId::LEFT_LEG, sample(0.25))];
        assert_eq!(drive(&loco, &gait, false).0, ArmBehavior::Pumping);
    }

    #[test]
    fn test_resting_lowers_hand() {
        let (_, limb) = drive(&Locomotion::default(), &[], false);
        assert!((limb.target().position - limb.landmark(LandmarkKind::Lowered)).length() < 1e-5);
    }

    #[test]
    fn test_suspended_leaves_target_alone() {
        let (_, limb) = drive(&Locomotion::default(), &[], true);
        assert_eq!(limb.target(), limb.rest_target());
    }

    #[test]
    fn test_pump_swings_forward_and_back() {
        let mut loco = Locomotion::default();
        loco.update(Vec3::new(0.0, 0.0, -5.0), Pose::IDENTITY, true, 0.0);
        let ctx = SimContext::default();
        let curves = CurveLibrary::builtin();
        let frame = Frame {
            ctx: &ctx,
            locomotion: &loco,
            ground: &NoGround,
            curves: &curves,
            dt: 1.0,
            gait_clock: 0.0,
            gait: &[],
            attacking: false,
        };
        let limb = test_controller(LimbId::RIGHT_ARM);
        let pump = ArmPump::new(ArmConfig::default());
        let (back, _) = pump.pump_pose(&limb, 0.0, &frame);
        let (front, _) = pump.pump_pose(&limb, 0.5, &frame);
        let waist = limb.landmark(LandmarkKind::Waist);
        // Forward is -Z
        assert!(front.z < waist.z);
        assert!(back.z > waist.z);
    }

    #[test]
    fn test_pump_yaw_is_clamped() {
        let mut loco = Locomotion::default();
        // Pure strafe right
        loco.update(Vec3::new(5.0, 0.0, -0.001), Pose::IDENTITY, true, 0.0);
        let ctx = SimContext::default();
        let curves = CurveLibrary::builtin();
        let frame = Frame {
            ctx: &ctx,
            locomotion: &loco,
            ground: &NoGround,
            curves: &curves,
            dt: 1.0,
            gait_clock: 0.0,
            gait: &[],
            attacking: false,
        };
        let limb = test_controller(LimbId::RIGHT_ARM);
        let (front, _) = ArmPump::new(ArmConfig::default()).pump_pose(&limb, 0.5, &frame);
        let swing = front - limb.landmark(LandmarkKind::Waist);
        let flat = Vec3::new(swing.x, 0.0, swing.z).normalize();
        let angle = flat.angle_between(BodyAxes::FORWARD).to_degrees();
        assert!(angle <= 45.0 + 1e-3, "swung {angle} degrees off forward");
    }
}
