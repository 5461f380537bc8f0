//! Per-frame simulation step
//!
//! Core game loop that advances the simulation in a fixed order.

use super::collision::{PlatformContact, find_obstacle_hit, resolve_platforms};
use super::lifecycle::LifecycleController;
use super::state::{GameEvent, GameState};
use crate::tuning::Tuning;

/// Input commands for a single step
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Jump is being requested (key held / touch active)
    pub jump: bool,
}

/// Advance the game state by one frame. `dt` is the normalized frame delta
/// (1.0 at 60 fps); it scales scrolling and score, not player physics.
pub fn tick(state: &mut GameState, lifecycle: &mut LifecycleController, input: &TickInput, dt: f32, tuning: &Tuning) {
    if state.game_over {
        return;
    }
    state.events.clear();
    state.time_ticks += 1;

    lifecycle.update_respawn(state, tuning);

    state.game_speed = tuning.world.base_speed + state.score as f32 * tuning.world.speed_per_score;
    if state.player.update(input.jump, tuning) {
        state.events.push(GameEvent::Jumped);
    }

    // Scroll, cull, refill
    let scroll = state.game_speed * dt;
    state.generator.scroll(&mut state.world, scroll);
    state.generator.cull(&mut state.world, tuning);
    state.generator.replenish_platforms(&mut state.world, &mut state.rng, tuning);
    state
        .generator
        .replenish_obstacles(&mut state.world, &mut state.rng, state.score, tuning);

    // Platforms: first landing, resting contact or head bump wins
    let outcome = resolve_platforms(&mut state.player, &state.world.platforms, tuning);
    for &platform_id in &outcome.passed_through {
        state.events.push(GameEvent::PassedThrough { platform_id });
    }
    match (outcome.contact, outcome.platform_id) {
        (PlatformContact::Landed, Some(platform_id)) => {
            state.events.push(GameEvent::Landed { platform_id });
        }
        (PlatformContact::HeadBump, Some(platform_id)) => {
            state.events.push(GameEvent::HeadBump { platform_id });
        }
        _ => {}
    }

    if outcome.contact.blocks() {
        state.fall_safe_timer = 0;
    } else {
        state.player.on_ground = false;
        state.fall_safe_timer += 1;
    }

    if let Some(index) = find_obstacle_hit(&state.player, &state.world.obstacles, &tuning.collision) {
        lifecycle.handle_obstacle_hit(state, index, tuning);
    }

    if !state.game_over {
        lifecycle.check_fall(state, tuning);
    }

    if !state.game_over {
        state.score += f64::from(state.game_speed * tuning.world.score_rate * dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::PlayerState;
    use proptest::prelude::*;

    fn new_state(seed: u64) -> (GameState, LifecycleController, Tuning) {
        let tuning = Tuning::default();
        (GameState::new(seed, &tuning), LifecycleController::new(), tuning)
    }

    #[test]
    fn test_player_stays_on_start_platform() {
        let (mut state, mut lifecycle, tuning) = new_state(1);
        for _ in 0..60 {
            tick(&mut state, &mut lifecycle, &TickInput::default(), 1.0, &tuning);
            assert!(!(state.player.on_ground && state.player.state == PlayerState::Falling));
        }
        assert_eq!(state.lives, 3);
        assert_eq!(state.player.bottom(), tuning.world.rows.row(0).y);
        assert_eq!(state.player.state, PlayerState::Running);
        assert_eq!(state.fall_safe_timer, 0);
    }

    #[test]
    fn test_running_keeps_animation_clock() {
        let (mut state, mut lifecycle, tuning) = new_state(8);
        let start = state.player.state_frames;
        for frame in 1..=20 {
            tick(&mut state, &mut lifecycle, &TickInput::default(), 1.0, &tuning);
            assert_eq!(state.player.state, PlayerState::Running);
            assert!(state.player.on_ground);
            assert_eq!(state.player.state_frames, start + frame);
            assert!(state.events.is_empty());
        }
    }

    #[test]
    fn test_one_frame_drop_reports_landing() {
        let (mut state, mut lifecycle, tuning) = new_state(9);
        let start_id = state.generator.start_platform_id.unwrap();
        // Support lost for a frame: exactly one frame of gravity before touching down
        state.player.on_ground = false;

        tick(&mut state, &mut lifecycle, &TickInput::default(), 1.0, &tuning);
        assert!(state.events.contains(&GameEvent::Landed { platform_id: start_id }));
        assert!(state.player.on_ground);
        assert_eq!(state.player.bottom(), tuning.world.rows.row(0).y);
    }

    #[test]
    fn test_landing_event_after_jump() {
        let (mut state, mut lifecycle, tuning) = new_state(2);
        tick(&mut state, &mut lifecycle, &TickInput { jump: true }, 1.0, &tuning);
        assert!(state.events.contains(&GameEvent::Jumped));
        assert_eq!(state.player.state, PlayerState::Jumping);

        let mut landed = false;
        for _ in 0..80 {
            tick(&mut state, &mut lifecycle, &TickInput::default(), 1.0, &tuning);
            if state.events.iter().any(|e| matches!(e, GameEvent::Landed { .. })) {
                landed = true;
                assert!(state.player.on_ground);
                assert_eq!(state.player.vel.y, 0.0);
                break;
            }
        }
        assert!(landed);
    }

    #[test]
    fn test_score_and_speed_grow() {
        let (mut state, mut lifecycle, tuning) = new_state(3);
        tick(&mut state, &mut lifecycle, &TickInput::default(), 1.0, &tuning);
        let first = state.score;
        assert!(first > 0.0);
        tick(&mut state, &mut lifecycle, &TickInput::default(), 2.0, &tuning);
        assert!(state.score > first);
        assert!(state.game_speed >= tuning.world.base_speed);

        let before = state.score;
        tick(&mut state, &mut lifecycle, &TickInput::default(), 0.0, &tuning);
        assert_eq!(state.score, before);
    }

    #[test]
    fn test_world_scrolls_by_speed_times_delta() {
        let (mut state, mut lifecycle, tuning) = new_state(4);
        let id = state.world.platforms[1].id;
        let x0 = state.world.platform(id).unwrap().rect.left();
        tick(&mut state, &mut lifecycle, &TickInput::default(), 1.5, &tuning);
        let x1 = state.world.platform(id).unwrap().rect.left();
        assert!((x0 - x1 - tuning.world.base_speed * 1.5).abs() < 1e-3);
    }

    #[test]
    fn test_fall_safety_timeout_costs_one_life() {
        let (mut state, mut lifecycle, tuning) = new_state(5);
        // Airborne with nothing below
        state.world.platforms.clear();
        state.player.on_ground = false;
        state.player.pos.y = 0.0;
        state.fall_safe_timer = tuning.lifecycle.fall_safe_frames;

        tick(&mut state, &mut lifecycle, &TickInput::default(), 1.0, &tuning);
        assert_eq!(state.lives, 2);
        assert!(state.respawn.active);
        assert_eq!(state.fall_safe_timer, 0);
    }

    #[test]
    fn test_obstacle_hit_during_tick() {
        let (mut state, mut lifecycle, tuning) = new_state(6);
        state.world.obstacles.clear();
        let feet = state.player.bottom();
        // Spike placed so it is under the player after one frame of scroll
        let x = state.player.pos.x + 10.0 + tuning.world.base_speed;
        let id = state.world.spawn_obstacle(glam::Vec2::new(x, feet - 30.0), 30.0);

        tick(&mut state, &mut lifecycle, &TickInput::default(), 1.0, &tuning);
        assert_eq!(state.lives, 2);
        assert!(state.player.invincible);
        assert!(state.world.obstacles.iter().all(|o| o.id != id));
        assert!(state.events.contains(&GameEvent::ObstacleHit { lives_left: 2 }));
    }

    #[test]
    fn test_game_over_freezes_state() {
        let (mut state, mut lifecycle, tuning) = new_state(7);
        state.game_over = true;
        let score = state.score;
        let ticks = state.time_ticks;
        tick(&mut state, &mut lifecycle, &TickInput { jump: true }, 1.0, &tuning);
        assert_eq!(state.score, score);
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let (mut state1, mut lc1, tuning) = new_state(99999);
        let (mut state2, mut lc2, _) = new_state(99999);

        for frame in 0..600 {
            let input = TickInput { jump: frame % 37 < 3 };
            tick(&mut state1, &mut lc1, &input, 1.0, &tuning);
            tick(&mut state2, &mut lc2, &input, 1.0, &tuning);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.lives, state2.lives);
        assert_eq!(state1.world.platforms.len(), state2.world.platforms.len());
        assert_eq!(state1.world.obstacles.len(), state2.world.obstacles.len());
        assert_eq!(state1.player.pos, state2.player.pos);
        assert_eq!(state1.score, state2.score);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_frame_invariants(
            seed in any::<u64>(),
            frames in proptest::collection::vec((any::<bool>(), 0.0f32..3.0), 1..400),
        ) {
            let (mut state, mut lifecycle, tuning) = new_state(seed);
            let mut lives = state.lives;
            for (jump, dt) in frames {
                let score = state.score;
                let was_over = state.game_over;
                tick(&mut state, &mut lifecycle, &TickInput { jump }, dt, &tuning);

                prop_assert!(!(state.player.on_ground && state.player.state == PlayerState::Falling));
                prop_assert!(state.player.vel.y <= tuning.player.max_fall_speed);
                prop_assert!(state.lives <= lives && lives - state.lives <= 1);
                prop_assert_eq!(state.game_over, state.lives == 0);
                if !was_over && !state.game_over {
                    prop_assert!(state.score >= score);
                    if dt > 0.01 {
                        prop_assert!(state.score > score);
                    }
                }
                lives = state.lives;
            }
        }
    }
}
