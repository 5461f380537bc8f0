//! Procedural world generation
//!
//! Each lane keeps a cursor at its rightmost generated edge. Cursors are
//! world coordinates and scroll with the entities, so a lane is refilled
//! whenever its cursor drifts inside the look-ahead horizon.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::geometry::Rect;
use super::state::{Platform, World};
use crate::consts::LANE_COUNT;
use crate::tuning::Tuning;

/// Consecutive spawn calls allowed to leave a lane cursor in place
const MAX_STALLED_SPAWNS: u32 = 4;

/// Platform and obstacle spawner
#[derive(Debug, Clone)]
pub struct WorldGenerator {
    /// Rightmost generated edge per lane (bottom first)
    pub last_platform_x: [f32; LANE_COUNT],
    /// Placements per lane since the last skipped slot
    skip_counters: [u32; LANE_COUNT],
    /// Obstacle placement cursor
    pub last_obstacle_x: f32,
    /// The safe starting platform, until it scrolls away
    pub start_platform_id: Option<u32>,
}

impl WorldGenerator {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            last_platform_x: [0.0; LANE_COUNT],
            skip_counters: [0; LANE_COUNT],
            last_obstacle_x: tuning.obstacles.start_x,
            start_platform_id: None,
        }
    }

    pub fn start_platform<'a>(&self, world: &'a World) -> Option<&'a Platform> {
        self.start_platform_id.and_then(|id| world.platform(id))
    }

    /// Build the opening world: a wide centered start platform in the bottom
    /// lane, a seed platform in each upper lane, then a few generated
    /// platforms per lane and a full look-ahead buffer.
    pub fn seed_world(&mut self, world: &mut World, rng: &mut Pcg32, tuning: &Tuning) {
        let wt = &tuning.world;
        let height = wt.platform_height;

        let start_width = wt.start_platform_width;
        let start = Rect::new(
            tuning.viewport.center_x() - start_width / 2.0,
            wt.rows.row(0).y,
            start_width,
            height,
        );
        self.start_platform_id = Some(world.spawn_platform(start, &tuning.world.rows));
        self.last_platform_x[0] = start.right();

        for lane in 0..LANE_COUNT {
            if lane > 0 {
                let row = wt.rows.row(lane);
                let seed = Rect::new(wt.lane_seed_x, row.y, row.base_width + wt.lane_seed_extra_width, height);
                world.spawn_platform(seed, &tuning.world.rows);
                self.last_platform_x[lane] = seed.right();
            }
            for _ in 0..wt.initial_platforms_per_lane {
                self.spawn_platform_in_lane(lane, world, rng, tuning);
            }
        }

        self.replenish_platforms(world, rng, tuning);
        log::debug!(
            "Seeded world: {} platforms, lane cursors {:?}",
            world.platforms.len(),
            self.last_platform_x
        );
    }

    /// Place the next platform in `lane`, or skip a slot to widen the gap.
    /// Returns the new platform's id if one was placed.
    pub fn spawn_platform_in_lane(
        &mut self,
        lane: usize,
        world: &mut World,
        rng: &mut Pcg32,
        tuning: &Tuning,
    ) -> Option<u32> {
        let wt = &tuning.world;
        let row = *wt.rows.row(lane);

        // At least one placement between skips, so the cursor always gains a platform width
        if self.skip_counters[lane] >= wt.skip_interval.max(1) && rng.random::<f32>() < wt.skip_chance {
            self.skip_counters[lane] = 0;
            self.last_platform_x[lane] += rng.random_range(row.min_gap..=row.max_gap);
            log::debug!("Lane {} skipped a slot, cursor now {:.0}", lane, self.last_platform_x[lane]);
            return None;
        }

        let clearance = if lane == 0 {
            self.start_platform(world).map(|p| p.rect.right() + wt.start_clearance)
        } else {
            None
        };

        for _ in 0..=wt.max_placement_retries {
            let gap = rng.random_range(row.min_gap..=row.max_gap);
            let x = self.last_platform_x[lane] + gap;
            let width = row.base_width + rng.random::<f32>() * wt.width_range;

            if let Some(clear_x) = clearance {
                if x < clear_x {
                    self.last_platform_x[lane] = clear_x;
                    continue;
                }
            }

            let rect = Rect::new(x, row.y, width, wt.platform_height);
            let id = world.spawn_platform(rect, &tuning.world.rows);
            self.last_platform_x[lane] = rect.right();
            self.skip_counters[lane] += 1;
            return Some(id);
        }

        log::warn!("Lane {} placement retries exhausted at x={:.0}", lane, self.last_platform_x[lane]);
        None
    }

    /// Fill every lane out to the look-ahead horizon. Returns platforms placed.
    pub fn replenish_platforms(&mut self, world: &mut World, rng: &mut Pcg32, tuning: &Tuning) -> usize {
        let horizon = tuning.viewport.width + tuning.world.lookahead;
        let mut placed = 0;
        for lane in 0..LANE_COUNT {
            let mut stalled = 0;
            while self.last_platform_x[lane] < horizon {
                let before = self.last_platform_x[lane];
                if self.spawn_platform_in_lane(lane, world, rng, tuning).is_some() {
                    placed += 1;
                }
                if self.last_platform_x[lane] > before {
                    stalled = 0;
                    continue;
                }
                stalled += 1;
                if stalled > MAX_STALLED_SPAWNS {
                    log::warn!("Lane {} cursor stuck at x={:.0}, leaving it short of the horizon", lane, before);
                    break;
                }
            }
        }
        placed
    }

    /// Spawn chance grows with score up to the configured cap
    pub fn obstacle_chance(score: f64, tuning: &Tuning) -> f32 {
        let ot = &tuning.obstacles;
        (ot.base_chance + score as f32 * ot.chance_per_score).min(ot.max_chance)
    }

    fn in_protected_zone(&self, x: f32, world: &World, tuning: &Tuning) -> bool {
        self.start_platform(world)
            .is_some_and(|start| (x - start.rect.center_x()).abs() < tuning.obstacles.protected_radius)
    }

    /// Try to put a spike on a platform near `x`. Fails when the dice say no,
    /// when no wide-enough platform is nearby, or when the spot is crowded.
    pub fn try_spawn_obstacle(
        &self,
        x: f32,
        world: &mut World,
        rng: &mut Pcg32,
        score: f64,
        tuning: &Tuning,
    ) -> Option<u32> {
        let ot = &tuning.obstacles;

        if self.in_protected_zone(x, world, tuning) {
            return None;
        }
        if rng.random::<f32>() > Self::obstacle_chance(score, tuning) {
            return None;
        }

        let lane = rng.random_range(0..LANE_COUNT);
        let row_y = tuning.world.rows.row(lane).y;

        let host = world
            .platforms
            .iter()
            .filter(|p| {
                (p.rect.top() - row_y).abs() < ot.lane_band
                    && x >= p.rect.left() - ot.search_margin
                    && x <= p.rect.right() + ot.search_margin
            })
            .min_by(|a, b| {
                let da = (a.rect.center_x() - x).abs();
                let db = (b.rect.center_x() - x).abs();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })?;

        if host.rect.width() < ot.min_platform_width {
            return None;
        }
        let center = host.rect.center_x();
        if self.in_protected_zone(center, world, tuning) {
            return None;
        }

        let size = ot.min_size + rng.random::<f32>() * ot.size_range;
        let pos = Vec2::new(center - size / 2.0, host.rect.top() - size);

        let crowded = world
            .obstacles
            .iter()
            .any(|o| (o.pos.x - pos.x).abs() < ot.min_distance && (o.pos.y - pos.y).abs() < ot.min_y_band);
        if crowded {
            log::debug!("Rejected crowded obstacle site at x={:.0}", pos.x);
            return None;
        }

        Some(world.spawn_obstacle(pos, size))
    }

    /// Walk the obstacle cursor out to its horizon. The cursor always
    /// advances, even when a site is rejected. Returns obstacles placed.
    pub fn replenish_obstacles(&mut self, world: &mut World, rng: &mut Pcg32, score: f64, tuning: &Tuning) -> usize {
        let ot = &tuning.obstacles;
        let horizon = tuning.viewport.width + ot.horizon;
        let mut placed = 0;
        while self.last_obstacle_x < horizon {
            let next = self.last_obstacle_x + ot.gap + rng.random_range(-ot.gap_jitter..=ot.gap_jitter);
            if self.try_spawn_obstacle(next, world, rng, score, tuning).is_some() {
                self.last_obstacle_x = next;
                placed += 1;
            } else {
                self.last_obstacle_x += ot.gap;
            }
        }
        placed
    }

    /// Move everything (cursors included) left by `amount`
    pub fn scroll(&mut self, world: &mut World, amount: f32) {
        for platform in &mut world.platforms {
            platform.rect.pos.x -= amount;
        }
        for obstacle in &mut world.obstacles {
            obstacle.pos.x -= amount;
        }
        for cursor in &mut self.last_platform_x {
            *cursor -= amount;
        }
        self.last_obstacle_x -= amount;
    }

    /// Drop entities whose right edge has passed far enough behind the screen
    pub fn cull(&mut self, world: &mut World, tuning: &Tuning) -> usize {
        let before = world.platforms.len() + world.obstacles.len();
        let platform_margin = tuning.world.platform_cull_margin;
        let obstacle_margin = tuning.world.obstacle_cull_margin;
        world.platforms.retain(|p| p.rect.right() > -platform_margin);
        world.obstacles.retain(|o| o.pos.x + o.size > -obstacle_margin);

        if self.start_platform_id.is_some() && self.start_platform(world).is_none() {
            log::debug!("Starting platform scrolled away");
            self.start_platform_id = None;
        }
        before - (world.platforms.len() + world.obstacles.len())
    }
}
