//! Data-driven game balance
//!
//! Every magic number the simulation depends on lives here so it can be
//! overridden from JSON without touching the core. Unspecified fields keep
//! their defaults, which reproduce the shipped feel of the game.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading or validating a [`Tuning`]
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(&'static str),
}

/// Visible play area in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
        }
    }
}

impl Viewport {
    pub fn center_x(&self) -> f32 {
        self.width / 2.0
    }
}

/// One horizontal lane platforms spawn in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowConfig {
    /// Top edge of every platform in this lane
    pub y: f32,
    pub min_gap: f32,
    pub max_gap: f32,
    /// Narrowest platform generated in this lane
    pub base_width: f32,
}

/// The three lanes, bottom (index 0) first
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowLayout {
    pub rows: [RowConfig; LANE_COUNT],
}

impl RowLayout {
    /// Standard layout: lanes 120 units apart, rising from the bottom of the viewport
    pub fn for_height(height: f32) -> Self {
        Self {
            rows: [
                RowConfig {
                    y: height - 120.0,
                    min_gap: 100.0,
                    max_gap: 200.0,
                    base_width: 180.0,
                },
                RowConfig {
                    y: height - 240.0,
                    min_gap: 100.0,
                    max_gap: 180.0,
                    base_width: 150.0,
                },
                RowConfig {
                    y: height - 360.0,
                    min_gap: 100.0,
                    max_gap: 180.0,
                    base_width: 120.0,
                },
            ],
        }
    }

    pub fn row(&self, index: usize) -> &RowConfig {
        &self.rows[index.min(LANE_COUNT - 1)]
    }
}

impl Default for RowLayout {
    fn default() -> Self {
        Self::for_height(VIEWPORT_HEIGHT)
    }
}

/// Player physics, counted in frames at the nominal 60 fps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub width: f32,
    pub height: f32,
    /// Initial vertical velocity of a jump (negative is up)
    pub jump_force: f32,
    pub gravity: f32,
    /// Terminal fall speed
    pub max_fall_speed: f32,
    pub max_coyote_frames: u32,
    pub jump_cooldown_frames: u32,
    /// Window after takeoff in which platforms can be passed from below
    pub jump_grace_frames: u32,
    pub jump_through_effect_frames: u32,
    pub invincibility_frames: u32,
    /// Visibility toggles every this many frames while invincible
    pub blink_interval: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            width: PLAYER_WIDTH,
            height: PLAYER_HEIGHT,
            jump_force: -12.0,
            gravity: 0.5,
            max_fall_speed: 20.0,
            max_coyote_frames: 8,
            jump_cooldown_frames: 15,
            jump_grace_frames: 5,
            jump_through_effect_frames: 10,
            invincibility_frames: 60,
            blink_interval: 5,
        }
    }
}

/// Collision windows. These are playtested values and deliberately asymmetric
/// between landing and head-bump.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    /// How far below a platform top the player's feet may be and still land
    pub landing_tolerance: f32,
    /// How far above a platform bottom the player's head may be and still bump
    pub bump_tolerance: f32,
    /// A rising player moving faster than this (more negative) is not bumped
    pub bump_escape_speed: f32,
    /// Feet may sit this far below a platform top and still count as "under" it
    pub pass_through_top_tolerance: f32,
    /// Horizontal inset on each side of a platform for pass-through overlap
    pub pass_through_margin: f32,
    pub side_margin: f32,
    pub side_band: f32,
    /// Fraction of an obstacle's height the feet must pass before it hurts
    pub obstacle_hit_fraction: f32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            landing_tolerance: 20.0,
            bump_tolerance: 10.0,
            bump_escape_speed: -2.0,
            pass_through_top_tolerance: 5.0,
            pass_through_margin: 10.0,
            side_margin: 5.0,
            side_band: 10.0,
            obstacle_hit_fraction: 0.7,
        }
    }
}

/// Platform generation, scrolling and scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    pub rows: RowLayout,
    pub platform_height: f32,
    /// Extra width sampled on top of a lane's base width
    pub width_range: f32,
    /// Placements in a lane before a skip becomes possible
    pub skip_interval: u32,
    pub skip_chance: f32,
    /// Lanes are filled until their cursor reaches viewport width + lookahead
    pub lookahead: f32,
    pub start_platform_width: f32,
    /// Minimum lane-0 gap after the starting platform
    pub start_clearance: f32,
    /// X of the first platform seeded in the upper lanes
    pub lane_seed_x: f32,
    pub lane_seed_extra_width: f32,
    pub initial_platforms_per_lane: u32,
    pub max_placement_retries: u32,
    /// Platforms are removed once their right edge is this far left of 0
    pub platform_cull_margin: f32,
    pub obstacle_cull_margin: f32,
    pub base_speed: f32,
    pub speed_per_score: f32,
    /// Score gained per unit of scroll speed per normalized frame
    pub score_rate: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            rows: RowLayout::default(),
            platform_height: PLATFORM_HEIGHT,
            width_range: 120.0,
            skip_interval: 8,
            skip_chance: 0.3,
            lookahead: 1200.0,
            start_platform_width: 400.0,
            start_clearance: 50.0,
            lane_seed_x: 100.0,
            lane_seed_extra_width: 120.0,
            initial_platforms_per_lane: 5,
            max_placement_retries: 4,
            platform_cull_margin: 100.0,
            obstacle_cull_margin: 50.0,
            base_speed: 3.0,
            speed_per_score: 0.001,
            score_rate: 0.1,
        }
    }
}

/// Obstacle placement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleTuning {
    /// Cursor position at the start of a session
    pub start_x: f32,
    pub gap: f32,
    /// Candidate x is jittered by up to this much either way
    pub gap_jitter: f32,
    pub horizon: f32,
    pub base_chance: f32,
    pub chance_per_score: f32,
    pub max_chance: f32,
    /// Vertical tolerance when matching a platform to a lane
    pub lane_band: f32,
    /// How far beyond a platform's ends a candidate may land and still use it
    pub search_margin: f32,
    pub min_platform_width: f32,
    pub min_size: f32,
    pub size_range: f32,
    pub min_distance: f32,
    pub min_y_band: f32,
    /// No obstacle spawns this close to the starting platform's center
    pub protected_radius: f32,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            start_x: 400.0,
            gap: 250.0,
            gap_jitter: 50.0,
            horizon: 1000.0,
            base_chance: 0.6,
            chance_per_score: 0.00005,
            max_chance: 0.8,
            lane_band: 5.0,
            search_margin: 50.0,
            min_platform_width: 120.0,
            min_size: 25.0,
            size_range: 10.0,
            min_distance: 100.0,
            min_y_band: 50.0,
            protected_radius: 500.0,
        }
    }
}

/// Lives, falls and respawn
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleTuning {
    pub lives: u8,
    /// Airborne frames without contact before a fall is forced
    pub fall_safe_frames: u32,
    /// Distance below the viewport that counts as fallen
    pub fall_margin: f32,
    pub respawn_frames: u32,
    pub safe_zone_half_width: f32,
    pub safe_platform_width: f32,
    pub fallback_platform_width: f32,
    pub fallback_left: f32,
    pub fallback_right_extra: f32,
    pub synthesized_width: f32,
    pub strip_tolerance: f32,
    pub strip_inset: f32,
    pub respawn_pulse_rate: f32,
}

impl Default for LifecycleTuning {
    fn default() -> Self {
        Self {
            lives: START_LIVES,
            fall_safe_frames: 90,
            fall_margin: 100.0,
            respawn_frames: 30,
            safe_zone_half_width: 200.0,
            safe_platform_width: 180.0,
            fallback_platform_width: 150.0,
            fallback_left: 100.0,
            fallback_right_extra: 300.0,
            synthesized_width: 200.0,
            strip_tolerance: 10.0,
            strip_inset: 20.0,
            respawn_pulse_rate: 0.3,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub viewport: Viewport,
    pub player: PlayerTuning,
    pub collision: CollisionTuning,
    pub world: WorldTuning,
    pub obstacles: ObstacleTuning,
    pub lifecycle: LifecycleTuning,
}

impl Tuning {
    /// Defaults with the viewport (and lane layout) fitted to a screen size
    pub fn for_viewport(width: f32, height: f32) -> Self {
        let mut tuning = Self::default();
        tuning.viewport = Viewport { width, height };
        tuning.world.rows = RowLayout::for_height(height);
        tuning
    }

    /// Parse and validate a JSON override
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return Err(TuningError::Invalid("viewport must have positive size"));
        }
        for row in &self.world.rows.rows {
            if row.min_gap < 0.0 || row.min_gap > row.max_gap {
                return Err(TuningError::Invalid("row gap range must satisfy 0 <= min <= max"));
            }
            if row.base_width <= 0.0 {
                return Err(TuningError::Invalid("row base width must be positive"));
            }
            if row.y < 0.0 || row.y > self.viewport.height {
                return Err(TuningError::Invalid("row must lie inside the viewport"));
            }
        }
        if self.world.skip_interval == 0 {
            return Err(TuningError::Invalid("skip interval must allow at least one platform between skips"));
        }
        if !(0.0..=1.0).contains(&self.world.skip_chance) {
            return Err(TuningError::Invalid("skip chance must be in [0, 1]"));
        }
        if self.world.width_range < 0.0 {
            return Err(TuningError::Invalid("platform width range must be non-negative"));
        }
        if self.player.gravity <= 0.0 {
            return Err(TuningError::Invalid("gravity must be positive"));
        }
        if self.player.jump_force >= 0.0 {
            return Err(TuningError::Invalid("jump force must point upward (negative)"));
        }
        if self.lifecycle.respawn_frames == 0 {
            return Err(TuningError::Invalid("respawn animation needs at least one frame"));
        }
        if self.lifecycle.lives == 0 {
            return Err(TuningError::Invalid("a session needs at least one life"));
        }
        let fraction = self.collision.obstacle_hit_fraction;
        if fraction <= 0.0 || fraction > 1.0 {
            return Err(TuningError::Invalid("obstacle hit fraction must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.obstacles.max_chance) {
            return Err(TuningError::Invalid("obstacle chance cap must be in [0, 1]"));
        }
        if self.obstacles.gap <= 0.0 || self.obstacles.gap_jitter < 0.0 || self.obstacles.gap <= self.obstacles.gap_jitter {
            return Err(TuningError::Invalid("obstacle gap must be positive and larger than its jitter"));
        }
        Ok(())
    }
}
