//! # Locomotion
//!
//! Movement intent and body state read by every pose generator.
//!
//! The owning game layer writes velocity, body pose and flags once per tick;
//! the generators only read the derived queries (`rush`, `walk_velocity`, ...).

use bevy::prelude::Component;
use serde::{Deserialize, Serialize};

use crate::config::LocomotionConfig;
use crate::math::{finite_or, BodyAxes, Pose, Vec3, EPSILON};

/// Rush below this counts as standing still
pub const WALK_THRESHOLD: f32 = 0.001;

/// Body motion and intent flags for one character
#[derive(Component, Clone, Debug, Serialize, Deserialize)]
pub struct Locomotion {
    /// Body pose in world space
    pub body: Pose,
    /// Body velocity in world space
    pub velocity: Vec3,
    /// Running (vs walking) gait requested
    pub running: bool,
    /// Crouch toggle
    pub crouching: bool,
    /// Guard stance requested
    pub guarding: bool,
    /// Ground contact this tick
    pub grounded: bool,
    /// Seconds since ground contact was last seen
    pub air_time: f32,
    /// Grace period before ground loss counts as airborne
    pub coyote_time: f32,
    /// Top speed, used to normalise rush
    pub run_speed: f32,
    /// Speed when not running
    pub walk_speed: f32,
}

impl Default for Locomotion {
    fn default() -> Self {
        Self::new(&LocomotionConfig::default())
    }
}

impl Locomotion {
    pub fn new(config: &LocomotionConfig) -> Self {
        Self {
            body: Pose::IDENTITY,
            velocity: Vec3::ZERO,
            running: false,
            crouching: false,
            guarding: false,
            grounded: true,
            air_time: 0.0,
            coyote_time: config.coyote_time,
            run_speed: config.run_speed,
            walk_speed: config.walk_speed,
        }
    }

    /// Update from velocity and body state
    pub fn update(&mut self, velocity: Vec3, body: Pose, grounded: bool, delta: f32) {
        self.velocity = velocity;
        self.body = body;
        self.grounded = grounded;

        if grounded {
            self.air_time = 0.0;
        } else {
            self.air_time += delta.max(0.0);
        }
    }

    /// Airborne once ground contact has been missing for the coyote window
    pub fn airborne(&self) -> bool {
        !self.grounded && self.air_time > self.coyote_time
    }

    /// Speed the intent layer should move at for a unit input
    pub fn target_speed(&self) -> f32 {
        if self.running {
            self.run_speed
        } else {
            self.walk_speed
        }
    }

    /// World velocity for a stick-style input (magnitude clamped to 1)
    pub fn velocity_for_input(&self, input: Vec3) -> Vec3 {
        let flat = Vec3::new(input.x, 0.0, input.z);
        flat.clamp_length_max(1.0) * self.target_speed()
    }

    pub fn toggle_crouch(&mut self) {
        self.crouching = !self.crouching;
    }

    pub fn toggle_run(&mut self) {
        self.running = !self.running;
    }

    pub fn toggle_guard(&mut self) {
        self.guarding = !self.guarding;
    }

    // ------------------------------------------------------------------------
    // Derived queries
    // ------------------------------------------------------------------------

    /// Horizontal velocity in the body frame (vertical motion ignored)
    pub fn walk_velocity(&self) -> Vec3 {
        let local = self.body.rotation.inverse() * self.velocity;
        let v = Vec3::new(local.x, 0.0, local.z);
        if v.is_finite() {
            v
        } else {
            Vec3::ZERO
        }
    }

    /// Unit heading of the walk velocity in the body frame (zero at rest)
    pub fn walk_direction(&self) -> Vec3 {
        self.walk_velocity().normalize_or_zero()
    }

    /// Signed speed along the body's forward axis
    pub fn forward_velocity(&self) -> f32 {
        self.walk_velocity().dot(BodyAxes::FORWARD)
    }

    pub fn moving_forward(&self) -> bool {
        self.forward_velocity() > 0.0
    }

    /// Walk speed as a fraction of run speed
    pub fn rush(&self) -> f32 {
        finite_or(self.walk_velocity().length() / self.run_speed.max(EPSILON), 0.0)
    }

    /// Forward speed as a signed fraction of run speed
    pub fn forward_rush(&self) -> f32 {
        finite_or(self.forward_velocity() / self.run_speed.max(EPSILON), 0.0)
    }

    pub fn is_walking(&self) -> bool {
        self.rush() > WALK_THRESHOLD
    }
}
