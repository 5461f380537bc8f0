//! Collision resolution between the player and scrolling geometry
//!
//! The tricky part of a one-way-platform runner: deciding every frame
//! whether an overlap is a landing, a head bump, or a jump passing through
//! from below. Resolution order is fixed so the outcome is deterministic.

use super::state::{Obstacle, Platform, Player, PlayerState};
use crate::tuning::{CollisionTuning, Tuning};

/// Slack for float error when comparing feet to a platform top
const REST_EPSILON: f32 = 1e-3;

/// What happened between the player and one platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformContact {
    None,
    /// Rising through the platform inside the jump grace window
    PassThrough,
    /// Feet snapped onto the platform top
    Landed,
    /// Head snapped under the platform bottom
    HeadBump,
    /// Standing still exactly on the platform top
    Resting,
    /// Cosmetic horizontal correction while dropping past an edge
    SideNudge,
}

impl PlatformContact {
    /// Landing, resting and head bumps stop the scan and count as solid contact
    pub fn blocks(&self) -> bool {
        matches!(
            self,
            PlatformContact::Landed | PlatformContact::Resting | PlatformContact::HeadBump
        )
    }
}

/// Result of scanning every platform for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformOutcome {
    pub contact: PlatformContact,
    /// Platform that produced the blocking contact
    pub platform_id: Option<u32>,
    /// Platforms the player passed through before the scan stopped
    pub passed_through: Vec<u32>,
}

/// Resolve the player against a single platform
pub fn resolve_platform(player: &mut Player, platform: &Platform, tuning: &Tuning) -> PlatformContact {
    let ct = &tuning.collision;
    let rect = &platform.rect;

    if player.can_jump_through(rect, ct) {
        player.trigger_jump_through_effect(tuning.player.jump_through_effect_frames);
        return PlatformContact::PassThrough;
    }

    if !player.rect().overlaps(rect) {
        if resting_on(player, platform) {
            player.on_ground = true;
            player.jumping_up = false;
            player.transition(PlayerState::Running);
            return PlatformContact::Resting;
        }
        return PlatformContact::None;
    }

    let bottom = player.bottom();
    let top = player.top();

    let landing = bottom >= rect.top() && bottom <= rect.top() + ct.landing_tolerance && player.vel.y > 0.0;
    if landing {
        player.pos.y = rect.top() - player.size.y;
        player.vel.y = 0.0;
        player.on_ground = true;
        player.jumping_up = false;
        player.respawning = false;
        if player.vel.y == 0.0 && player.on_ground {
            player.transition(PlayerState::Running);
        }
        return PlatformContact::Landed;
    }

    let head_bump = top <= rect.bottom() && top >= rect.bottom() - ct.bump_tolerance && player.vel.y < 0.0;
    if head_bump && (!player.jumping_up || player.vel.y >= ct.bump_escape_speed) {
        player.pos.y = rect.bottom();
        player.vel.y = 0.0;
        player.jumping_up = false;
        return PlatformContact::HeadBump;
    }

    if side_nudge(player, platform, ct) {
        return PlatformContact::SideNudge;
    }

    PlatformContact::None
}

/// Feet exactly on the top edge with no vertical motion. Strict overlap
/// never sees this contact, so support is checked separately.
fn resting_on(player: &Player, platform: &Platform) -> bool {
    let rect = &platform.rect;
    player.vel.y == 0.0
        && (player.bottom() - rect.top()).abs() <= REST_EPSILON
        && player.rect().overlaps_x_inset(rect, 0.0)
}

fn side_nudge(player: &mut Player, platform: &Platform, ct: &CollisionTuning) -> bool {
    let rect = &platform.rect;
    let p = player.rect();

    let alongside = p.overlaps_x_inset(rect, ct.side_margin) && (p.top() - rect.top()).abs() > ct.side_band;
    let dropping_past = player.vel.y > 0.0 && p.bottom() < rect.top() + ct.side_band;
    if !alongside || !dropping_past {
        return false;
    }

    if p.right() > rect.left() && p.left() < rect.left() + ct.side_band {
        player.pos.x = rect.left() - player.size.x;
        true
    } else if p.left() < rect.right() && p.right() > rect.right() - ct.side_band {
        player.pos.x = rect.right();
        true
    } else {
        false
    }
}

/// Scan platforms in list order; the first landing or head bump wins
pub fn resolve_platforms(player: &mut Player, platforms: &[Platform], tuning: &Tuning) -> PlatformOutcome {
    let mut passed_through = Vec::new();
    for platform in platforms {
        match resolve_platform(player, platform, tuning) {
            contact @ (PlatformContact::Landed | PlatformContact::Resting | PlatformContact::HeadBump) => {
                return PlatformOutcome {
                    contact,
                    platform_id: Some(platform.id),
                    passed_through,
                };
            }
            PlatformContact::PassThrough => passed_through.push(platform.id),
            PlatformContact::SideNudge | PlatformContact::None => {}
        }
    }
    PlatformOutcome {
        contact: PlatformContact::None,
        platform_id: None,
        passed_through,
    }
}

/// Triangle test approximated by its bounding box: the feet must be below
/// the hit fraction of the spike's height, so grazing the apex is harmless.
pub fn obstacle_hit(player: &Player, obstacle: &Obstacle, tuning: &CollisionTuning) -> bool {
    if player.invincible {
        return false;
    }
    let bounds = obstacle.rect();
    player.rect().overlaps(&bounds)
        && player.bottom() > bounds.top() + obstacle.size * tuning.obstacle_hit_fraction
}

/// Index of the first obstacle (in list order) the player is impaled on
pub fn find_obstacle_hit(player: &Player, obstacles: &[Obstacle], tuning: &CollisionTuning) -> Option<usize> {
    obstacles.iter().position(|o| obstacle_hit(player, o, tuning))
}
