//! Lives, falls, respawn and game over
//!
//! The host's game-over callback is injected here rather than looked up
//! globally; it fires exactly once, in the step that takes the last life.

use glam::Vec2;

use super::geometry::Rect;
use super::state::{GameEvent, GameState, PlayerState, RespawnState, World};
use crate::ease_out_cubic;
use crate::tuning::Tuning;

/// Receives the final floored score when a session ends
pub trait GameOverHook {
    fn on_game_over(&mut self, final_score: u64);
}

impl<F: FnMut(u64)> GameOverHook for F {
    fn on_game_over(&mut self, final_score: u64) {
        self(final_score)
    }
}

/// Owns the life/respawn/game-over transitions
#[derive(Default)]
pub struct LifecycleController {
    hook: Option<Box<dyn GameOverHook>>,
}

impl std::fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleController")
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl LifecycleController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook(hook: impl GameOverHook + 'static) -> Self {
        Self {
            hook: Some(Box::new(hook)),
        }
    }

    pub fn set_hook(&mut self, hook: impl GameOverHook + 'static) {
        self.hook = Some(Box::new(hook));
    }

    /// Take a life for the spike at `index`. Ignored while invincible.
    /// Returns true if a life was lost.
    pub fn handle_obstacle_hit(&mut self, state: &mut GameState, index: usize, tuning: &Tuning) -> bool {
        if state.player.invincible || index >= state.world.obstacles.len() {
            return false;
        }

        state.lives = state.lives.saturating_sub(1);
        let struck = state.world.obstacles.remove(index);
        state.events.push(GameEvent::ObstacleHit { lives_left: state.lives });
        log::info!("Hit obstacle {} ({} lives left)", struck.id, state.lives);

        if state.lives == 0 {
            self.end_game(state);
        } else {
            let player = &mut state.player;
            player.activate_invincibility(&tuning.player);
            player.on_ground = false;
            player.transition(PlayerState::Jumping);
            state.fall_safe_timer = 0;
        }
        true
    }

    /// Below the screen, or airborne without contact for too long
    pub fn has_fallen(state: &GameState, tuning: &Tuning) -> bool {
        state.player.top() > tuning.viewport.height + tuning.lifecycle.fall_margin
            || state.fall_safe_timer > tuning.lifecycle.fall_safe_frames
    }

    pub fn check_fall(&mut self, state: &mut GameState, tuning: &Tuning) {
        if Self::has_fallen(state, tuning) {
            self.handle_fall(state, tuning);
        }
    }

    /// Take a life for a fall and start the respawn (or end the game)
    pub fn handle_fall(&mut self, state: &mut GameState, tuning: &Tuning) {
        if state.respawn.active {
            return;
        }

        state.lives = state.lives.saturating_sub(1);
        state.fall_safe_timer = 0;
        state.events.push(GameEvent::LifeLost { lives_left: state.lives });
        log::info!("Fell ({} lives left)", state.lives);

        if state.lives == 0 {
            self.end_game(state);
        } else {
            self.start_respawn(state, tuning);
        }
    }

    /// Pick a landing platform and begin flying the player toward it
    pub fn start_respawn(&mut self, state: &mut GameState, tuning: &Tuning) {
        let size = state.player.size;

        let (platform_id, target, synthesized) = match find_safe_spawn_platform(&mut state.world, tuning) {
            Some((id, rect)) => {
                let target = Vec2::new(rect.center_x() - size.x / 2.0, rect.top() - size.y);
                (id, target, false)
            }
            None => {
                let lt = &tuning.lifecycle;
                let row = tuning.world.rows.row(0);
                let rect = Rect::new(
                    tuning.viewport.center_x() - lt.synthesized_width / 2.0,
                    row.y,
                    lt.synthesized_width,
                    tuning.world.platform_height,
                );
                let id = state.world.spawn_platform(rect, &tuning.world.rows);
                log::warn!("No safe respawn platform, synthesized platform {}", id);
                let target = Vec2::new(tuning.viewport.center_x() - size.x / 2.0, rect.top() - size.y);
                (id, target, true)
            }
        };

        let frames = tuning.lifecycle.respawn_frames;
        state.respawn = RespawnState {
            active: true,
            remaining: frames,
            total: frames,
            start: state.player.pos,
            target,
            platform_id: Some(platform_id),
            alpha: 1.0,
        };
        state.player.respawning = true;
        state.events.push(GameEvent::RespawnStarted { synthesized });
        log::info!("Respawning onto platform {} at ({:.0}, {:.0})", platform_id, target.x, target.y);
    }

    /// Advance the respawn animation by one frame
    pub fn update_respawn(&mut self, state: &mut GameState, tuning: &Tuning) {
        if !state.respawn.active {
            return;
        }

        let respawn = &mut state.respawn;
        respawn.remaining = respawn.remaining.saturating_sub(1);

        if respawn.remaining == 0 {
            respawn.active = false;
            respawn.alpha = 1.0;
            state.player.pos = respawn.target;
            state.player.settle(tuning.player.max_coyote_frames);
            state.fall_safe_timer = 0;
            state.events.push(GameEvent::RespawnFinished);
            log::info!("Respawn complete");
            return;
        }

        let eased = ease_out_cubic(respawn.progress());
        state.player.pos = respawn.start + (respawn.target - respawn.start) * eased;
        state.player.respawning = true;
        respawn.alpha = 0.5 + 0.5 * (respawn.remaining as f32 * tuning.lifecycle.respawn_pulse_rate).sin();
    }

    fn end_game(&mut self, state: &mut GameState) {
        state.game_over = true;
        let score = state.floored_score();
        state.events.push(GameEvent::GameOver { score });
        log::info!("Game over with score {}", score);
        if let Some(hook) = self.hook.as_mut() {
            hook.on_game_over(score);
        }
    }
}

/// Choose a bottom-lane platform to respawn on and clear its spikes.
///
/// Prefers a wide platform overlapping the safe zone around screen center,
/// closest center first; otherwise any reasonably wide platform near the
/// screen. Returns the platform's id and bounds.
pub fn find_safe_spawn_platform(world: &mut World, tuning: &Tuning) -> Option<(u32, Rect)> {
    let lt = &tuning.lifecycle;
    let row_y = tuning.world.rows.row(0).y;
    let center = tuning.viewport.center_x();
    let zone_start = center - lt.safe_zone_half_width;
    let zone_end = center + lt.safe_zone_half_width;

    let in_zone = world
        .platforms
        .iter()
        .filter(|p| {
            p.rect.top() == row_y
                && p.rect.width() >= lt.safe_platform_width
                && p.rect.right() > zone_start
                && p.rect.left() < zone_end
        })
        .min_by(|a, b| {
            let da = (a.rect.center_x() - center).abs();
            let db = (b.rect.center_x() - center).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });

    let chosen = in_zone.or_else(|| {
        world.platforms.iter().find(|p| {
            p.rect.top() == row_y
                && p.rect.width() >= lt.fallback_platform_width
                && p.rect.right() > lt.fallback_left
                && p.rect.left() < tuning.viewport.width + lt.fallback_right_extra
        })
    });

    let (id, rect) = chosen.map(|p| (p.id, p.rect))?;
    let stripped = strip_obstacles_from(world, &rect, tuning);
    if stripped > 0 {
        log::debug!("Cleared {} obstacles from respawn platform {}", stripped, id);
    }
    Some((id, rect))
}

/// Remove spikes resting on `platform`. Returns how many were removed.
pub fn strip_obstacles_from(world: &mut World, platform: &Rect, tuning: &Tuning) -> usize {
    let lt = &tuning.lifecycle;
    let before = world.obstacles.len();
    world.obstacles.retain(|o| {
        let resting = ((o.pos.y + o.size) - platform.top()).abs() < lt.strip_tolerance
            && o.pos.x > platform.left() + lt.strip_inset
            && o.pos.x + o.size < platform.right() - lt.strip_inset;
        !resting
    });
    before - world.obstacles.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn state_with_spike_under_player(tuning: &Tuning) -> GameState {
        let mut state = GameState::new(11, tuning);
        state.world.obstacles.clear();
        let feet = state.player.bottom();
        let x = state.player.pos.x + 10.0;
        state.world.spawn_obstacle(Vec2::new(x, feet - 30.0), 30.0);
        state
    }

    #[test]
    fn test_obstacle_hit_costs_one_life_and_grants_invincibility() {
        let tuning = Tuning::default();
        let mut state = state_with_spike_under_player(&tuning);
        let mut lifecycle = LifecycleController::new();
        let struck = state.world.obstacles[0].id;

        assert!(lifecycle.handle_obstacle_hit(&mut state, 0, &tuning));
        assert_eq!(state.lives, 2);
        assert!(state.player.invincible);
        assert!(!state.player.on_ground);
        assert_eq!(state.player.state, PlayerState::Jumping);
        assert!(state.world.obstacles.iter().all(|o| o.id != struck));
        assert!(!state.game_over);
    }

    #[test]
    fn test_invincible_hit_is_ignored() {
        let tuning = Tuning::default();
        let mut state = state_with_spike_under_player(&tuning);
        state.player.activate_invincibility(&tuning.player);
        let mut lifecycle = LifecycleController::new();

        assert!(!lifecycle.handle_obstacle_hit(&mut state, 0, &tuning));
        assert_eq!(state.lives, 3);
        assert_eq!(state.world.obstacles.len(), 1);
    }

    #[test]
    fn test_last_life_ends_game_and_calls_hook() {
        let tuning = Tuning::default();
        let mut state = state_with_spike_under_player(&tuning);
        state.lives = 1;
        state.score = 1234.9;

        let reported = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&reported);
        let mut lifecycle = LifecycleController::with_hook(move |score: u64| sink.borrow_mut().push(score));

        lifecycle.handle_obstacle_hit(&mut state, 0, &tuning);
        assert!(state.game_over);
        assert_eq!(state.lives, 0);
        assert_eq!(*reported.borrow(), vec![1234]);
        assert!(state.events.contains(&GameEvent::GameOver { score: 1234 }));
    }

    #[test]
    fn test_fall_starts_respawn_from_current_position() {
        let tuning = Tuning::default();
        let mut state = GameState::new(12, &tuning);
        state.player.pos.y = tuning.viewport.height + 200.0;
        let fall_pos = state.player.pos;
        let mut lifecycle = LifecycleController::new();

        lifecycle.check_fall(&mut state, &tuning);
        assert_eq!(state.lives, 2);
        assert!(state.respawn.active);
        assert!(state.player.respawning);
        assert_eq!(state.respawn.progress(), 0.0);
        assert_eq!(state.player.pos, fall_pos);
        assert_eq!(state.respawn.start, fall_pos);

        // A second fall while respawning is ignored
        lifecycle.handle_fall(&mut state, &tuning);
        assert_eq!(state.lives, 2);
    }

    #[test]
    fn test_respawn_ends_exactly_on_target() {
        let tuning = Tuning::default();
        let mut state = GameState::new(13, &tuning);
        state.player.pos.y = tuning.viewport.height + 200.0;
        let mut lifecycle = LifecycleController::new();
        lifecycle.handle_fall(&mut state, &tuning);
        let target = state.respawn.target;

        for _ in 0..tuning.lifecycle.respawn_frames - 1 {
            lifecycle.update_respawn(&mut state, &tuning);
            assert!(state.respawn.active);
            assert!(state.player.respawning);
        }
        lifecycle.update_respawn(&mut state, &tuning);

        assert!(!state.respawn.active);
        assert_eq!(state.player.pos, target);
        assert!(state.player.on_ground);
        assert!(!state.player.respawning);
        assert_eq!(state.player.vel, Vec2::ZERO);
        assert_eq!(state.player.coyote_time, tuning.player.max_coyote_frames);
        assert_eq!(state.player.jump_grace, 0);
        assert_eq!(state.player.jump_cooldown, 0);
        assert_eq!(state.player.state, PlayerState::Running);
    }

    #[test]
    fn test_respawn_prefers_start_platform_and_clears_spikes() {
        let tuning = Tuning::default();
        let mut state = GameState::new(14, &tuning);
        let start = state.generator.start_platform(&state.world).unwrap().rect;
        state
            .world
            .spawn_obstacle(Vec2::new(start.center_x() - 15.0, start.top() - 30.0), 30.0);

        let (id, rect) = find_safe_spawn_platform(&mut state.world, &tuning).unwrap();
        assert_eq!(Some(id), state.generator.start_platform_id);
        assert_eq!(rect, start);
        assert!(state.world.obstacles.iter().all(|o| o.center_x() != start.center_x()));
    }

    #[test]
    fn test_respawn_synthesizes_platform_when_none_fit() {
        let tuning = Tuning::default();
        let mut state = GameState::new(15, &tuning);
        state.world.platforms.clear();
        state.player.pos.y = tuning.viewport.height + 200.0;
        let mut lifecycle = LifecycleController::new();

        lifecycle.handle_fall(&mut state, &tuning);
        assert_eq!(state.world.platforms.len(), 1);
        let synthesized = &state.world.platforms[0];
        assert_eq!(state.respawn.platform_id, Some(synthesized.id));
        assert_eq!(synthesized.rect.width(), tuning.lifecycle.synthesized_width);
        assert_eq!(state.respawn.target.y, synthesized.rect.top() - state.player.size.y);
        assert!(state.events.contains(&GameEvent::RespawnStarted { synthesized: true }));
    }

    #[test]
    fn test_fall_on_last_life_is_game_over() {
        let tuning = Tuning::default();
        let mut state = GameState::new(16, &tuning);
        state.lives = 1;
        state.fall_safe_timer = tuning.lifecycle.fall_safe_frames + 1;
        let mut lifecycle = LifecycleController::new();

        lifecycle.check_fall(&mut state, &tuning);
        assert!(state.game_over);
        assert_eq!(state.lives, 0);
        assert!(!state.respawn.active);
    }
}
