//! Read-only view of a session for renderers
//!
//! Hosts draw from this; nothing in it feeds back into the simulation.

use serde::Serialize;

use super::geometry::Rect;
use super::state::{GameEvent, GameState, Obstacle, Platform, PlayerState};

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub rect: Rect,
    pub state: PlayerState,
    pub state_frames: u32,
    pub visible: bool,
    /// Opacity; pulses during respawn
    pub alpha: f32,
    pub invincible: bool,
    pub jump_through_effect: u32,
    pub on_ground: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RespawnView {
    pub progress: f32,
    pub target: Rect,
    pub platform_id: Option<u32>,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    pub platforms: &'a [Platform],
    pub obstacles: &'a [Obstacle],
    pub player: PlayerView,
    pub score: u64,
    pub lives: u8,
    pub game_speed: f32,
    pub game_over: bool,
    pub respawn: Option<RespawnView>,
    pub events: &'a [GameEvent],
}

impl<'a> Snapshot<'a> {
    pub fn capture(state: &'a GameState) -> Self {
        let player = &state.player;
        let respawn = state.respawn.active.then(|| RespawnView {
            progress: state.respawn.progress(),
            target: Rect {
                pos: state.respawn.target,
                size: player.size,
            },
            platform_id: state.respawn.platform_id,
        });

        Self {
            platforms: &state.world.platforms,
            obstacles: &state.world.obstacles,
            player: PlayerView {
                rect: player.rect(),
                state: player.state,
                state_frames: player.state_frames,
                visible: player.visible,
                alpha: if state.respawn.active { state.respawn.alpha } else { 1.0 },
                invincible: player.invincible,
                jump_through_effect: player.jump_through_effect,
                on_ground: player.on_ground,
            },
            score: state.floored_score(),
            lives: state.lives,
            game_speed: state.game_speed,
            game_over: state.game_over,
            respawn,
            events: &state.events,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
