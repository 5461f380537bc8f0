//! Game state and core simulation types
//!
//! Everything a frame step reads or writes lives in [`GameState`]; the
//! generator cursors and the RNG travel with it so a seed fully determines a run.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::worldgen::WorldGenerator;
use crate::consts::*;
use crate::tuning::{RowLayout, Tuning};

/// Animation/physics state of the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerState {
    #[default]
    Idle,
    Running,
    Jumping,
    Falling,
}

/// One of the three horizontal bands platforms spawn in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lane {
    Bottom,
    Middle,
    Top,
}

impl Lane {
    pub const ALL: [Lane; LANE_COUNT] = [Lane::Bottom, Lane::Middle, Lane::Top];

    pub fn index(self) -> usize {
        match self {
            Lane::Bottom => 0,
            Lane::Middle => 1,
            Lane::Top => 2,
        }
    }

    /// The lane whose configured row is nearest to a platform top
    pub fn classify(y: f32, rows: &RowLayout) -> Self {
        let mut best = Lane::Bottom;
        for lane in Lane::ALL {
            if (rows.row(lane.index()).y - y).abs() < (rows.row(best.index()).y - y).abs() {
                best = lane;
            }
        }
        best
    }
}

/// The runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    /// Only `y` is ever non-zero: the world scrolls, the player does not
    pub vel: Vec2,
    pub size: Vec2,
    pub state: PlayerState,
    /// Frames spent in the current state (drives sprite animation)
    pub state_frames: u32,
    pub on_ground: bool,
    pub coyote_time: u32,
    pub jump_cooldown: u32,
    pub jumping_up: bool,
    pub jump_grace: u32,
    pub jump_through_effect: u32,
    pub invincible: bool,
    pub invincibility_timer: u32,
    pub blink_timer: u32,
    /// False on the "off" beats of the invincibility blink
    pub visible: bool,
    /// Position is being driven by the respawn animation
    pub respawning: bool,
}

/// A landable slab
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub id: u32,
    pub rect: Rect,
    pub lane: Lane,
}

impl Platform {
    pub fn new(id: u32, rect: Rect, rows: &RowLayout) -> Self {
        Self {
            id,
            lane: Lane::classify(rect.top(), rows),
            rect,
        }
    }
}

/// A triangular spike resting on a platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    /// Top-left of the square bounding box
    pub pos: Vec2,
    pub size: f32,
    pub color: u32,
}

impl Obstacle {
    pub fn new(id: u32, pos: Vec2, size: f32) -> Self {
        Self {
            id,
            pos,
            size,
            color: OBSTACLE_COLOR,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size, self.size)
    }

    pub fn center_x(&self) -> f32 {
        self.pos.x + self.size / 2.0
    }
}

/// Scrolling entities, in spawn order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    pub platforms: Vec<Platform>,
    pub obstacles: Vec<Obstacle>,
    next_id: u32,
}

impl World {
    pub fn new() -> Self {
        Self {
            platforms: Vec::new(),
            obstacles: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn spawn_platform(&mut self, rect: Rect, rows: &RowLayout) -> u32 {
        let id = self.next_entity_id();
        self.platforms.push(Platform::new(id, rect, rows));
        id
    }

    pub fn spawn_obstacle(&mut self, pos: Vec2, size: f32) -> u32 {
        let id = self.next_entity_id();
        self.obstacles.push(Obstacle::new(id, pos, size));
        id
    }

    pub fn platform(&self, id: u32) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.id == id)
    }

    pub fn platforms_in_lane(&self, lane: Lane) -> impl Iterator<Item = &Platform> {
        self.platforms.iter().filter(move |p| p.lane == lane)
    }
}

/// Respawn animation bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RespawnState {
    pub active: bool,
    /// Frames left in the animation
    pub remaining: u32,
    pub total: u32,
    /// Player position when the fall was registered
    pub start: Vec2,
    /// Exact landing point on the target platform
    pub target: Vec2,
    /// Lookup only; the platform may scroll away before the animation ends
    pub platform_id: Option<u32>,
    /// Pulsing opacity for the respawn cue
    pub alpha: f32,
}

impl RespawnState {
    /// Animation progress in [0, 1]; 0 when inactive
    pub fn progress(&self) -> f32 {
        if !self.active || self.total == 0 {
            return 0.0;
        }
        1.0 - self.remaining as f32 / self.total as f32
    }
}

/// Things that happened during the last step, for host-side effects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Jumped,
    Landed { platform_id: u32 },
    HeadBump { platform_id: u32 },
    PassedThrough { platform_id: u32 },
    ObstacleHit { lives_left: u8 },
    LifeLost { lives_left: u8 },
    RespawnStarted { synthesized: bool },
    RespawnFinished,
    GameOver { score: u64 },
}

/// Complete game state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub player: Player,
    pub world: World,
    pub generator: WorldGenerator,
    pub respawn: RespawnState,
    /// Fractional score; hosts see it floored
    pub score: f64,
    pub lives: u8,
    pub game_speed: f32,
    pub game_over: bool,
    /// Consecutive frames without a blocking platform contact
    pub fall_safe_timer: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Events raised by the most recent step
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new session: starting platform, seeded lanes, player on the start
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut world = World::new();
        let mut generator = WorldGenerator::new(tuning);
        generator.seed_world(&mut world, &mut rng, tuning);

        let mut state = Self {
            seed,
            rng,
            player: Player::new(tuning),
            world,
            generator,
            respawn: RespawnState::default(),
            score: 0.0,
            lives: tuning.lifecycle.lives,
            game_speed: tuning.world.base_speed,
            game_over: false,
            fall_safe_timer: 0,
            time_ticks: 0,
            events: Vec::new(),
        };
        state.spawn_player_on_start(tuning);
        state
    }

    /// Put the player, grounded and running, on the middle of the starting platform
    pub fn spawn_player_on_start(&mut self, tuning: &Tuning) {
        let start = self
            .generator
            .start_platform(&self.world)
            .map(|p| p.rect)
            .unwrap_or_else(|| {
                let row = tuning.world.rows.row(0);
                let width = tuning.world.start_platform_width;
                Rect::new(
                    tuning.viewport.center_x() - width / 2.0,
                    row.y,
                    width,
                    tuning.world.platform_height,
                )
            });

        let player = &mut self.player;
        player.pos = Vec2::new(start.center_x() - player.size.x / 2.0, start.top() - player.size.y);
        player.vel = Vec2::ZERO;
        player.settle(tuning.player.max_coyote_frames);
        self.fall_safe_timer = 0;
    }

    /// Score as reported to hosts
    pub fn floored_score(&self) -> u64 {
        self.score.max(0.0).floor() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_follows_nearest_row() {
        let rows = RowLayout::for_height(600.0);
        assert_eq!(Lane::classify(480.0, &rows), Lane::Bottom);
        assert_eq!(Lane::classify(360.0, &rows), Lane::Middle);
        assert_eq!(Lane::classify(240.0, &rows), Lane::Top);
        assert_eq!(Lane::classify(0.0, &rows), Lane::Top);
    }

    #[test]
    fn test_overridden_rows_keep_generated_lane() {
        let mut tuning = Tuning::default();
        // Middle row pulled down near the bottom band
        tuning.world.rows.rows[1].y = 430.0;
        let state = GameState::new(21, &tuning);
        for p in &state.world.platforms {
            assert_eq!(tuning.world.rows.row(p.lane.index()).y, p.rect.top());
        }
        assert!(state.world.platforms_in_lane(Lane::Middle).count() > 0);
    }
}
