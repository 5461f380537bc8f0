//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - Physics counted in frames; only scroll and score see the frame delta
//! - No rendering or platform dependencies

pub mod clock;
pub mod collision;
pub mod geometry;
pub mod lifecycle;
pub mod player;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod worldgen;

pub use clock::SimulationClock;
pub use collision::{PlatformContact, PlatformOutcome, find_obstacle_hit, obstacle_hit, resolve_platform, resolve_platforms};
pub use geometry::Rect;
pub use lifecycle::{GameOverHook, LifecycleController, find_safe_spawn_platform, strip_obstacles_from};
pub use snapshot::{PlayerView, RespawnView, Snapshot};
pub use state::{GameEvent, GameState, Lane, Obstacle, Platform, Player, PlayerState, RespawnState, World};
pub use tick::{TickInput, tick};
pub use worldgen::WorldGenerator;
