//! Collision detection and response
//!
//! Dot-vs-dot overlap resolution (positional push plus velocity impulse) and
//! dot-vs-wall clamping with an inelastic bounce.

use glam::Vec2;

use super::state::{Arena, Dot};
use crate::consts::*;

/// Result of an overlap check between two dots
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the dots overlap
    pub hit: bool,
    /// Unit vector from the first dot toward the second
    pub normal: Vec2,
    /// Overlap depth (diameter minus center distance)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check overlap between two equal-sized dots
///
/// Coincident centers report a miss: there is no separating direction.
pub fn dot_dot_collision(a: Vec2, b: Vec2, diameter: f32) -> CollisionResult {
    let delta = b - a;
    let dist = delta.length();
    if dist > 0.0 && dist < diameter {
        CollisionResult {
            hit: true,
            normal: delta / dist,
            penetration: diameter - dist,
        }
    } else {
        CollisionResult::miss()
    }
}

/// Push overlapping pairs apart and kick their velocities in opposite directions
///
/// O(n²) over all unordered pairs, in index order. Returns the number of
/// pairs resolved.
pub fn resolve_dot_collisions(dots: &mut [Dot]) -> usize {
    let mut resolved = 0;
    for i in 0..dots.len() {
        let (head, tail) = dots.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            let result = dot_dot_collision(a.pos, b.pos, DOT_SIZE);
            if !result.hit {
                continue;
            }
            let overlap = result.penetration * COLLISION_PUSH;
            let push = result.normal * overlap * 0.5;
            let kick = result.normal * overlap * COLLISION_IMPULSE;
            a.pos -= push;
            b.pos += push;
            a.vel -= kick;
            b.vel += kick;
            resolved += 1;
        }
    }
    resolved
}

/// Clamp a dot inside the arena (inset by its radius), bouncing off walls
///
/// The velocity component is reflected to point back inside and scaled by
/// `BOUNCE`. An axis narrower than the dot pins it to the arena center.
/// Returns true if any wall was touched.
pub fn confine_to_arena(dot: &mut Dot, arena: Arena) -> bool {
    let (x, vx, hit_x) = confine_axis(dot.pos.x, dot.vel.x, arena.width);
    let (y, vy, hit_y) = confine_axis(dot.pos.y, dot.vel.y, arena.height);
    dot.pos = Vec2::new(x, y);
    dot.vel = Vec2::new(vx, vy);
    hit_x || hit_y
}

fn confine_axis(pos: f32, vel: f32, extent: f32) -> (f32, f32, bool) {
    let lo = DOT_RADIUS;
    let hi = extent - DOT_RADIUS;
    if hi < lo {
        return (extent * 0.5, 0.0, true);
    }
    if pos < lo {
        (lo, vel.abs() * BOUNCE, true)
    } else if pos > hi {
        (hi, -vel.abs() * BOUNCE, true)
    } else if pos.is_nan() {
        // A non-finite position can only come from corrupted input; recentre it.
        (extent * 0.5, 0.0, true)
    } else {
        (pos, vel, false)
    }
}
