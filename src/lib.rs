//! Lane Runner - an endless three-lane side-scroller
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player physics, collisions, world generation, lives)
//! - `tuning`: Data-driven game balance
//! - `game`: Host lifecycle facade (start/stop/restart/step)
//! - `web`: wasm-bindgen bindings for browser hosts

pub mod game;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use game::Game;
pub use tuning::{RowConfig, RowLayout, Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Nominal frame interval the per-frame physics is tuned for (60 fps)
    pub const FRAME_MS: f64 = 16.67;
    /// Largest normalized delta accepted in one step (prevents scroll jumps after stalls)
    pub const MAX_DELTA: f32 = 4.0;

    /// Default viewport
    pub const VIEWPORT_WIDTH: f32 = 800.0;
    pub const VIEWPORT_HEIGHT: f32 = 600.0;

    /// Number of platform lanes
    pub const LANE_COUNT: usize = 3;

    /// Platform thickness
    pub const PLATFORM_HEIGHT: f32 = 20.0;

    /// Lives at the start of a session
    pub const START_LIVES: u8 = 3;

    /// Player hitbox
    pub const PLAYER_WIDTH: f32 = 60.0;
    pub const PLAYER_HEIGHT: f32 = 40.0;

    /// Obstacle tint (fixed for every spike)
    pub const OBSTACLE_COLOR: u32 = 0xff3d3d;
}

/// Ease-out cubic: fast start, gentle settle at `t = 1`
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}
