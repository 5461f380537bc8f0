//! Player physics and state machine
//!
//! Physics is counted in whole frames at the nominal 60 fps; only the
//! world scroll and the score are scaled by the frame delta.

use glam::Vec2;

use super::geometry::Rect;
use super::state::{Player, PlayerState};
use crate::tuning::{CollisionTuning, PlayerTuning, Tuning};

impl Player {
    /// A fresh player standing just above the bottom of the viewport
    pub fn new(tuning: &Tuning) -> Self {
        let size = Vec2::new(tuning.player.width, tuning.player.height);
        Self {
            pos: Vec2::new(
                tuning.viewport.center_x() - size.x / 2.0,
                tuning.viewport.height - size.y - 50.0,
            ),
            vel: Vec2::ZERO,
            size,
            state: PlayerState::Idle,
            state_frames: 0,
            on_ground: false,
            coyote_time: 0,
            jump_cooldown: 0,
            jumping_up: false,
            jump_grace: 0,
            jump_through_effect: 0,
            invincible: false,
            invincibility_timer: 0,
            blink_timer: 0,
            visible: true,
            respawning: false,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    /// Move to `next`. Re-entering the current state is a no-op so the
    /// animation clock keeps running. Returns whether the state changed.
    pub fn transition(&mut self, next: PlayerState) -> bool {
        if self.state == next {
            return false;
        }
        self.state = next;
        self.state_frames = 0;
        true
    }

    /// Standing still on solid ground with every transient timer cleared
    pub fn settle(&mut self, max_coyote: u32) {
        self.vel = Vec2::ZERO;
        self.on_ground = true;
        self.coyote_time = max_coyote;
        self.jumping_up = false;
        self.jump_grace = 0;
        self.jump_cooldown = 0;
        self.jump_through_effect = 0;
        self.respawning = false;
        self.transition(PlayerState::Running);
    }

    pub fn activate_invincibility(&mut self, tuning: &PlayerTuning) {
        self.invincible = true;
        self.invincibility_timer = tuning.invincibility_frames;
        self.visible = true;
        self.blink_timer = 0;
    }

    fn update_invincibility(&mut self, tuning: &PlayerTuning) {
        if !self.invincible {
            return;
        }
        self.invincibility_timer = self.invincibility_timer.saturating_sub(1);

        self.blink_timer += 1;
        if self.blink_timer >= tuning.blink_interval {
            self.visible = !self.visible;
            self.blink_timer = 0;
        }

        if self.invincibility_timer == 0 {
            self.invincible = false;
            self.visible = true;
        }
    }

    /// Jump is honored on the ground or inside the coyote window, once the cooldown is over
    pub fn can_jump(&self) -> bool {
        (self.on_ground || self.coyote_time > 0) && self.jump_cooldown == 0
    }

    /// Advance one frame. Returns true if a jump started this frame.
    pub fn update(&mut self, jump_requested: bool, tuning: &Tuning) -> bool {
        let pt = &tuning.player;
        self.state_frames = self.state_frames.saturating_add(1);
        self.update_invincibility(pt);

        if self.respawning {
            // Position is driven by the respawn animation
            self.vel = Vec2::ZERO;
            self.on_ground = true;
            self.transition(PlayerState::Running);
            return false;
        }

        if self.on_ground {
            self.coyote_time = pt.max_coyote_frames;
            self.jumping_up = false;
            if self.vel.y >= 0.0 {
                self.transition(PlayerState::Running);
            }
        } else if self.coyote_time > 0 {
            self.coyote_time -= 1;
        }

        self.jump_through_effect = self.jump_through_effect.saturating_sub(1);
        self.jump_cooldown = self.jump_cooldown.saturating_sub(1);

        let jumped = jump_requested && self.can_jump();
        if jumped {
            self.vel.y = pt.jump_force;
            self.on_ground = false;
            self.coyote_time = 0;
            self.jump_cooldown = pt.jump_cooldown_frames;
            self.transition(PlayerState::Jumping);
            self.jumping_up = true;
            self.jump_grace = pt.jump_grace_frames;
        }

        self.jump_grace = self.jump_grace.saturating_sub(1);

        if !self.on_ground {
            self.vel.y += pt.gravity;
            if self.vel.y > 0.0 {
                self.transition(PlayerState::Falling);
            }
        }

        self.vel.y = self.vel.y.min(pt.max_fall_speed);
        self.pos.y += self.vel.y;

        // The world scrolls past a horizontally pinned player
        self.pos.x = tuning.viewport.center_x() - self.size.x / 2.0;

        jumped
    }

    /// Rising through `platform` from below inside the jump grace window
    pub fn can_jump_through(&self, platform: &Rect, tuning: &CollisionTuning) -> bool {
        if !self.jumping_up || self.vel.y >= 0.0 || self.jump_grace == 0 {
            return false;
        }

        let bottom = self.bottom();
        let top = platform.top();
        let under = bottom <= top + tuning.pass_through_top_tolerance;
        let overlapping = self.rect().overlaps_x_inset(platform, tuning.pass_through_margin);
        let will_cross = bottom + self.vel.y.abs() > top;

        under && overlapping && will_cross
    }

    pub fn trigger_jump_through_effect(&mut self, frames: u32) {
        self.jump_through_effect = frames;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grounded_player(tuning: &Tuning) -> Player {
        let mut player = Player::new(tuning);
        player.settle(tuning.player.max_coyote_frames);
        player
    }

    #[test]
    fn test_no_jump_without_ground_or_coyote() {
        let tuning = Tuning::default();
        let mut player = Player::new(&tuning);
        player.on_ground = false;
        player.coyote_time = 0;
        player.jump_cooldown = 0;
        player.vel.y = 1.0;

        let jumped = player.update(true, &tuning);
        assert!(!jumped);
        assert!(player.vel.y > 0.0);
        assert_eq!(player.state, PlayerState::Falling);
    }

    #[test]
    fn test_jump_from_ground() {
        let tuning = Tuning::default();
        let mut player = grounded_player(&tuning);
        let y0 = player.pos.y;

        assert!(player.update(true, &tuning));
        assert_eq!(player.state, PlayerState::Jumping);
        assert!(!player.on_ground);
        assert!(player.jumping_up);
        assert_eq!(player.coyote_time, 0);
        assert_eq!(player.jump_cooldown, tuning.player.jump_cooldown_frames);
        assert_eq!(player.jump_grace, tuning.player.jump_grace_frames - 1);
        // jump force plus one frame of gravity
        assert_eq!(player.vel.y, tuning.player.jump_force + tuning.player.gravity);
        assert!(player.pos.y < y0);
    }

    #[test]
    fn test_coyote_window_allows_late_jump() {
        let tuning = Tuning::default();
        let mut player = grounded_player(&tuning);
        player.on_ground = false;
        player.coyote_time = 3;

        assert!(player.update(true, &tuning));
        assert_eq!(player.state, PlayerState::Jumping);
    }

    #[test]
    fn test_cooldown_blocks_jump() {
        let tuning = Tuning::default();
        let mut player = grounded_player(&tuning);
        player.jump_cooldown = 2;
        assert!(!player.update(true, &tuning));
        assert_eq!(player.jump_cooldown, 1);
    }

    #[test]
    fn test_same_state_transition_keeps_animation_clock() {
        let tuning = Tuning::default();
        let mut player = grounded_player(&tuning);
        for _ in 0..5 {
            player.update(false, &tuning);
        }
        assert_eq!(player.state, PlayerState::Running);
        assert_eq!(player.state_frames, 5);
        assert!(!player.transition(PlayerState::Running));
        assert_eq!(player.state_frames, 5);
        assert!(player.transition(PlayerState::Falling));
        assert_eq!(player.state_frames, 0);
    }

    #[test]
    fn test_fall_speed_clamped() {
        let tuning = Tuning::default();
        let mut player = Player::new(&tuning);
        for _ in 0..200 {
            player.update(false, &tuning);
        }
        assert_eq!(player.vel.y, tuning.player.max_fall_speed);
        assert!(!(player.on_ground && player.state == PlayerState::Falling));
    }

    #[test]
    fn test_horizontal_position_recentered() {
        let tuning = Tuning::default();
        let mut player = grounded_player(&tuning);
        player.pos.x = 3.0;
        player.update(false, &tuning);
        assert_eq!(player.pos.x, tuning.viewport.center_x() - player.size.x / 2.0);
    }

    #[test]
    fn test_respawning_suspends_physics() {
        let tuning = Tuning::default();
        let mut player = Player::new(&tuning);
        player.respawning = true;
        player.vel.y = 7.0;
        player.pos = Vec2::new(12.0, 34.0);
        player.update(true, &tuning);
        assert_eq!(player.pos, Vec2::new(12.0, 34.0));
        assert_eq!(player.vel, Vec2::ZERO);
        assert_eq!(player.state, PlayerState::Running);
    }

    #[test]
    fn test_invincibility_blinks_then_expires() {
        let tuning = Tuning::default();
        let mut player = grounded_player(&tuning);
        player.activate_invincibility(&tuning.player);

        for _ in 0..tuning.player.blink_interval {
            player.update(false, &tuning);
        }
        assert!(!player.visible);
        assert!(player.invincible);

        for _ in 0..tuning.player.invincibility_frames {
            player.update(false, &tuning);
        }
        assert!(!player.invincible);
        assert!(player.visible);
    }

    #[test]
    fn test_jump_through_from_below() {
        let tuning = Tuning::default();
        let mut player = grounded_player(&tuning);
        player.update(true, &tuning);

        let x = player.pos.x - 20.0;
        // Platform top sits just above the player's feet
        let above = Rect::new(x, player.bottom() - 3.0, 100.0, 20.0);
        assert!(player.can_jump_through(&above, &tuning.collision));

        // Too far to the side: only the outer margin overlaps
        let aside = Rect::new(player.pos.x + player.size.x - 5.0, player.bottom() - 3.0, 100.0, 20.0);
        assert!(!player.can_jump_through(&aside, &tuning.collision));

        // Grace window over
        player.jump_grace = 0;
        assert!(!player.can_jump_through(&above, &tuning.collision));
    }
}
