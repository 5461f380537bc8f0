//! Frame delta normalization
//!
//! Host timestamps (milliseconds) are turned into a delta where 1.0 means one
//! nominal 60 fps frame. The first step after `start` always uses 1.0 so a
//! resume after a pause never produces a scroll spike.

use crate::consts::{FRAME_MS, MAX_DELTA};

#[derive(Debug, Clone, Default)]
pub struct SimulationClock {
    last_time: Option<f64>,
    running: bool,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin (or resume) with a fresh timestamp basis
    pub fn start(&mut self) {
        self.running = true;
        self.last_time = None;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Normalized delta since the previous timestamp, clamped to `[0, MAX_DELTA]`
    pub fn delta(&mut self, timestamp: f64) -> f32 {
        let dt = match self.last_time {
            Some(last) => ((timestamp - last) / FRAME_MS) as f32,
            None => 1.0,
        };
        self.last_time = Some(timestamp);
        if dt.is_nan() {
            return 0.0;
        }
        dt.clamp(0.0, MAX_DELTA)
    }
}
