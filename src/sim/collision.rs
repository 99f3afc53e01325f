//! Collision detection and response
//!
//! Ball against static circular pegs and the two side walls. One pass per
//! substep, no iteration: every overlapping peg is resolved independently
//! and the corrections add up. That can inject a little energy when two pegs
//! are touched at once, which is what gives the board its chaotic bounce.

use glam::Vec2;
use rand::Rng;

use super::state::{Ball, Peg};
use crate::config::PhysicsConfig;

/// Result of a circle/circle overlap test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal from the peg toward the ball
    pub normal: Vec2,
    /// Overlap depth (positive when touching)
    pub penetration: f32,
}

/// Normal used when the ball centre sits exactly on a peg centre: push up
pub const DEGENERATE_NORMAL: Vec2 = Vec2::new(0.0, -1.0);

/// Check overlap between a ball and a circle
pub fn circle_contact(ball_pos: Vec2, ball_radius: f32, center: Vec2, radius: f32) -> Option<Contact> {
    let delta = ball_pos - center;
    let dist_sq = delta.length_squared();
    let min_dist = ball_radius + radius;

    if dist_sq >= min_dist * min_dist {
        return None;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > f32::EPSILON {
        delta / dist
    } else {
        DEGENERATE_NORMAL
    };

    Some(Contact {
        normal,
        penetration: min_dist - dist,
    })
}

/// Velocity after bouncing off a surface with the given normal.
///
/// The normal component is reversed and scaled by `restitution`, the
/// tangential component is damped by `friction`. Separating velocities are
/// returned unchanged.
#[inline]
pub fn bounce_velocity(velocity: Vec2, normal: Vec2, restitution: f32, friction: f32) -> Vec2 {
    let vn = velocity.dot(normal);
    if vn >= 0.0 {
        return velocity;
    }
    let normal_part = normal * vn;
    let tangent_part = velocity - normal_part;
    tangent_part * (1.0 - friction) - normal_part * restitution
}

/// Board extents the ball must stay within horizontally
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub width: f32,
}

/// Resolve the ball against candidate pegs and the walls.
///
/// `candidates` index into `pegs` and may contain pegs that are not touching
/// (the spatial query over-approximates). Touched peg ids are pushed to
/// `hits`.
pub fn resolve<R: Rng>(
    ball: &mut Ball,
    pegs: &[Peg],
    candidates: &[usize],
    bounds: Bounds,
    config: &PhysicsConfig,
    rng: &mut R,
    hits: &mut Vec<u32>,
) {
    for &i in candidates {
        let Some(peg) = pegs.get(i) else {
            continue;
        };
        if resolve_peg(ball, peg, config, rng) {
            hits.push(peg.id);
        }
    }

    resolve_walls(ball, bounds, config.restitution);

    let speed = ball.vel.length();
    if speed > config.max_speed {
        ball.vel = ball.vel / speed * config.max_speed;
    }
}

/// Push the ball out of one peg and bounce it. Returns true on contact.
pub fn resolve_peg<R: Rng>(ball: &mut Ball, peg: &Peg, config: &PhysicsConfig, rng: &mut R) -> bool {
    let Some(contact) = circle_contact(ball.pos, ball.radius, peg.pos, peg.radius) else {
        return false;
    };

    // Partial correction avoids snapping the ball out in one step
    ball.pos += contact.normal * contact.penetration * config.correction;

    if ball.vel.dot(contact.normal) < 0.0 {
        ball.vel = bounce_velocity(ball.vel, contact.normal, config.restitution, config.friction);
        if config.bounce_jitter > 0.0 {
            let j = config.bounce_jitter;
            ball.vel += Vec2::new(rng.random_range(-j..=j), rng.random_range(-j..=j));
        }
    }
    true
}

/// Clamp to the side walls and bounce horizontally. Returns true on contact.
pub fn resolve_walls(ball: &mut Ball, bounds: Bounds, restitution: f32) -> bool {
    if ball.pos.x - ball.radius < 0.0 {
        ball.pos.x = ball.radius;
        ball.vel.x = ball.vel.x.abs() * restitution;
        true
    } else if ball.pos.x + ball.radius > bounds.width {
        ball.pos.x = bounds.width - ball.radius;
        ball.vel.x = -ball.vel.x.abs() * restitution;
        true
    } else {
        false
    }
}
