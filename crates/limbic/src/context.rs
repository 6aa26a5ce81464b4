//! # Simulation Context
//!
//! Session-wide state handed to every tick: the simulation clock and the
//! developer freeze switch. Owned by the top-level loop (or the `SimClock`
//! resource under Bevy), never global.

use serde::{Deserialize, Serialize};

/// Clock and debug switches for one simulation session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimContext {
    /// Seconds since the session started
    pub time: f32,
    /// Ticks since the session started
    pub frame: u64,
    /// Freeze pose generators; springs keep relaxing
    pub dev_mode: bool,
}

impl SimContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by one tick
    pub fn advance(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.time += dt;
        }
        self.frame += 1;
    }

    pub fn toggle_dev_mode(&mut self) {
        self.dev_mode = !self.dev_mode;
        tracing::info!("Dev mode {}", if self.dev_mode { "on" } else { "off" });
    }
}
