//! # Limb Spring
//!
//! Damped spring that drags a limb's visible target toward its commanded
//! target, giving arms weighted secondary motion instead of an instant snap.
//!
//! Mass is fixed at 1. Rotation passes straight through; only position is
//! filtered.

use serde::{Deserialize, Serialize};

use crate::config::SpringConfig;
use crate::math::{Pose, Quat, Vec3};

/// Spring-filtered proxy of a commanded pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimbSpring {
    /// How hard the proxy is pulled toward the root
    pub stiffness: f32,
    /// 1.0 is critically damped, below 1.0 overshoots a little
    pub damp_ratio: f32,
    /// Fraction of body velocity fed into the spring each step
    pub body_coupling: f32,
    position: Vec3,
    rotation: Quat,
    velocity: Vec3,
}

impl LimbSpring {
    /// New spring resting on `start`
    pub fn new(config: &SpringConfig, start: Pose) -> Self {
        Self {
            stiffness: config.stiffness,
            damp_ratio: config.damp_ratio,
            body_coupling: config.body_coupling,
            position: start.position,
            rotation: start.rotation,
            velocity: Vec3::ZERO,
        }
    }

    pub fn damping_constant(&self) -> f32 {
        const MASS: f32 = 1.0;
        self.damp_ratio * 2.0 * (MASS * self.stiffness.max(0.0)).sqrt()
    }

    /// Integrate one step toward `root`.
    ///
    /// `body_velocity` is the character's velocity in the body frame.
    pub fn step(&mut self, root: Pose, body_velocity: Vec3, dt: f32) -> Pose {
        if dt > 0.0 {
            let displacement = self.position - root.position;
            let force = -self.stiffness * displacement - self.damping_constant() * self.velocity;
            self.velocity += force * dt;
            self.position += self.velocity * dt;
            self.velocity += body_velocity * self.body_coupling;
        }
        self.rotation = root.rotation;

        if !self.position.is_finite() || !self.velocity.is_finite() {
            self.reset(root);
        }
        self.output()
    }

    /// Jump to `pose` and drop all momentum
    pub fn reset(&mut self, pose: Pose) {
        self.position = pose.position;
        self.rotation = pose.rotation;
        self.velocity = Vec3::ZERO;
    }

    pub fn output(&self) -> Pose {
        Pose::new(self.position, self.rotation)
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }
}
