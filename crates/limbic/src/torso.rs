//! # Torso Sway
//!
//! Chest target, hip bounce and head follow for the torso chain
//! (hips → spine → chest).
//!
//! ## Layers
//!
//! - **Lean**: along the walk heading, scaled by speed, floored so sideways
//!   motion still leans a little
//! - **Bounce**: hips dip in time with each step
//! - **Wobble** and **twist**: side-to-side sway locked to the gait phase
//! - **Breathing**: slow vertical aim oscillation that fades out with speed
//! - **Head follow**: the head target trails the chest horizontally

use serde::{Deserialize, Serialize};

use crate::config::TorsoConfig;
use crate::curves::CurveKey;
use crate::limb::{Frame, LimbController, LimbStrategy};
use crate::math::{smoothing_factor, wrap_unit, BodyAxes, Pose, Vec3, TAU};

/// What the torso did this tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorsoSample {
    /// Chest offset along the heading
    pub lean: Vec3,
    /// Vertical hip offset
    pub bounce: f32,
    /// Lateral chest offset
    pub wobble: Vec3,
    /// Direction the chest faces
    pub aim: Vec3,
    /// Commanded chest target
    pub chest: Pose,
    /// Hips (torso root) position
    pub hips: Vec3,
    /// Head target
    pub head: Pose,
}

/// Torso strategy
#[derive(Debug, Clone)]
pub struct TorsoSway {
    config: TorsoConfig,
    head_rest: Pose,
    head: Pose,
}

impl TorsoSway {
    pub fn new(config: TorsoConfig, head_rest: Pose) -> Self {
        Self {
            config,
            head_rest,
            head: head_rest,
        }
    }

    pub fn head(&self) -> Pose {
        self.head
    }

    pub fn head_rest(&self) -> Pose {
        self.head_rest
    }

    pub fn reset_head(&mut self) {
        self.head = self.head_rest;
    }

    fn max_lean(&self, limb: &LimbController) -> f32 {
        limb.length() * self.config.lean_ratio
    }

    /// Hip dip for the current step: one dip per leg per cycle
    pub fn bounce(&self, frame: &Frame<'_>) -> f32 {
        let Some(leg) = frame.any_leg() else {
            return 0.0;
        };
        let steps = frame.leg_count() as f32;
        let progress = wrap_unit(leg.phase * steps);
        frame.curves.sample(CurveKey::HipBounce, progress) * leg.step_height
            - leg.step_length * self.config.bounce_sink_ratio
    }

    fn lean(&self, limb: &LimbController, frame: &Frame<'_>) -> Vec3 {
        let loco = frame.locomotion;
        let forward = loco.forward_rush().max(self.config.min_forward_lean);
        let mut lean = loco.walk_direction() * loco.rush() * self.max_lean(limb) * forward;
        if loco.crouching {
            lean += BodyAxes::FORWARD * self.config.crouch_lean;
        }
        lean
    }

    fn wobble(&self, limb: &LimbController, phase: f32, frame: &Frame<'_>) -> Vec3 {
        let loco = frame.locomotion;
        if !loco.running {
            return Vec3::ZERO;
        }
        let amount = limb.width() * self.config.lean_ratio * self.config.wobble_ratio;
        BodyAxes::RIGHT * (phase * TAU).sin() * amount * loco.forward_rush().max(0.0)
    }

    fn aim(&self, limb: &LimbController, phase: f32, frame: &Frame<'_>) -> Vec3 {
        let loco = frame.locomotion;
        let mut aim = BodyAxes::FORWARD;

        if loco.is_walking() {
            let swing = ((phase * TAU).cos() + 1.0) * 0.5;
            let twist = BodyAxes::RIGHT.lerp(-BodyAxes::RIGHT, swing);
            aim += twist * limb.width() * loco.forward_rush() * self.config.twist_ratio;
        }

        let breath = ((frame.ctx.time * self.config.breath_hertz * TAU).cos() + 1.0) * 0.5;
        let calm = 1.0 - loco.rush().clamp(0.0, 1.0);
        aim += BodyAxes::UP.lerp(-BodyAxes::UP, breath) * self.config.breath_amplitude * calm;

        if loco.crouching {
            aim -= BodyAxes::UP * self.config.crouch_pitch;
        }
        aim
    }

    /// Keep the head over the chest, leaning a little with speed
    fn follow_head(&mut self, limb: &LimbController, chest: Vec3, bounce: f32, frame: &Frame<'_>) {
        let lead = self.max_lean(limb) * self.config.head_lean_ratio * frame.locomotion.forward_rush().max(0.0);
        let destination = Vec3::new(chest.x, self.head_rest.position.y + bounce, chest.z)
            + BodyAxes::FORWARD * lead;
        let t = smoothing_factor(self.config.head_follow_rate, frame.dt);
        self.head.position = self.head.position.lerp(destination, t);
    }
}

impl LimbStrategy for TorsoSway {
    type Output = TorsoSample;

    fn drive(&mut self, limb: &mut LimbController, frame: &Frame<'_>) -> TorsoSample {
        let hips_rest = limb.rig().root.position;

        // A strike owns the chest; the head still tracks whatever it does
        if frame.attacking {
            let chest = limb.target();
            self.follow_head(limb, chest.position, 0.0, frame);
            limb.set_root_position(hips_rest);
            return TorsoSample {
                lean: Vec3::ZERO,
                bounce: 0.0,
                wobble: Vec3::ZERO,
                aim: chest.rotation * BodyAxes::FORWARD,
                chest,
                hips: hips_rest,
                head: self.head,
            };
        }

        let phase = frame.any_leg().map_or(frame.gait_clock, |leg| leg.phase);
        let bounce = self.bounce(frame);
        let lean = self.lean(limb, frame);
        let wobble = self.wobble(limb, phase, frame);
        let aim = self.aim(limb, phase, frame);

        let hips = hips_rest + BodyAxes::UP * bounce + BodyAxes::FORWARD * (bounce * 0.5);
        limb.set_root_position(hips);

        let position = limb.rest_target().position + lean + wobble + BodyAxes::UP * bounce;
        limb.place_looking(position, aim, frame.dt);

        let chest = limb.target();
        self.follow_head(limb, chest.position, bounce, frame);

        TorsoSample {
            lean,
            bounce,
            wobble,
            aim,
            chest,
            hips,
            head: self.head,
        }
    }
}
