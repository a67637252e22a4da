//! Fixed timestep simulation tick
//!
//! Advances the dot field by one step. Deterministic given state and input:
//! all randomness is consumed at spawn.

use std::f32::consts::TAU;

use glam::Vec2;

use super::collision::{confine_to_arena, resolve_dot_collisions};
use super::state::{Arena, Dot, PointerState, SimState};
use crate::consts::*;

/// Inputs latched for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer sample taken before the tick began
    pub pointer: PointerState,
    /// Live arena bounds; `None` when the surface is unavailable
    pub arena: Option<Arena>,
}

/// Advance the simulation by one fixed timestep
///
/// A tick without an arena does nothing, including leaving the clock alone.
pub fn tick(state: &mut SimState, input: &TickInput, dt: f32) {
    let Some(arena) = input.arena else {
        return;
    };

    state.time += dt;
    state.time_ticks += 1;

    if input.pointer.inside {
        apply_pointer_repulsion(&mut state.dots, &input.pointer, dt);
    }

    resolve_dot_collisions(&mut state.dots);

    let t = state.time;
    for dot in &mut state.dots {
        apply_idle_drive(dot, t, dt);
        apply_friction(dot);
        dot.pos += dot.vel * dt;
        confine_to_arena(dot, arena);
    }
}

/// Push dots away from the pointer with linear falloff to zero at the radius
pub fn apply_pointer_repulsion(dots: &mut [Dot], pointer: &PointerState, dt: f32) {
    let radius = pointer.kind.radius();
    let scale = pointer.kind.impulse_scale();

    for dot in dots {
        let delta = dot.pos - pointer.pos;
        let dist = delta.length();
        if dist > POINTER_DEAD_ZONE && dist < radius {
            let force = STRENGTH * (1.0 - dist / radius);
            dot.vel += (delta / dist) * force * scale * dt;
        }
    }
}

/// Per-dot sinusoidal nudge so the field never fully settles
#[inline]
pub fn apply_idle_drive(dot: &mut Dot, t: f32, dt: f32) {
    let angle = t * dot.freq * TAU + dot.phase;
    dot.vel += Vec2::new(angle.sin(), angle.cos()) * IDLE_FORCE * dt;
}

/// Damp velocity and clamp to the speed limit
#[inline]
pub fn apply_friction(dot: &mut Dot) {
    dot.vel *= 1.0 - FRICTION;
    dot.vel = dot.vel.clamp_length_max(MAX_SPEED);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{ColorKey, PointerKind};

    fn arena() -> Arena {
        Arena::new(800.0, 600.0)
    }

    fn input_with_pointer(x: f32, y: f32, kind: PointerKind) -> TickInput {
        TickInput {
            pointer: PointerState {
                pos: Vec2::new(x, y),
                inside: true,
                kind,
            },
            arena: Some(arena()),
        }
    }

    fn still_dot(x: f32, y: f32) -> Dot {
        Dot::at(0, ColorKey(0), Vec2::new(x, y))
    }

    #[test]
    fn test_tick_without_arena_is_noop() {
        let mut state = SimState::new();
        state.dots.push(still_dot(5000.0, -40.0));
        state.dots[0].vel = Vec2::new(30.0, 0.0);
        let before = state.clone();

        tick(&mut state, &TickInput::default(), SIM_DT);

        assert_eq!(state.dots, before.dots);
        assert_eq!(state.time, 0.0);
        assert_eq!(state.time_ticks, 0);
    }

    #[test]
    fn test_tick_advances_clock() {
        let mut state = SimState::new();
        let input = TickInput {
            arena: Some(arena()),
            ..Default::default()
        };
        for _ in 0..60 {
            tick(&mut state, &input, SIM_DT);
        }
        assert_eq!(state.time_ticks, 60);
        assert!((state.time - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_pointer_repels_away() {
        let mut dots = vec![still_dot(150.0, 100.0)];
        let input = input_with_pointer(100.0, 100.0, PointerKind::Fine);
        apply_pointer_repulsion(&mut dots, &input.pointer, SIM_DT);

        // force = 3 * (1 - 50/160), scaled by 500 * dt
        let expected = 3.0 * (1.0 - 50.0 / 160.0) * 500.0 * SIM_DT;
        assert!((dots[0].vel.x - expected).abs() < 1e-3);
        assert!(dots[0].vel.y.abs() < 1e-6);
    }

    #[test]
    fn test_pointer_ignores_far_and_coincident_dots() {
        let mut dots = vec![still_dot(100.0, 100.0), still_dot(400.0, 100.0)];
        let input = input_with_pointer(100.0, 100.0, PointerKind::Fine);
        apply_pointer_repulsion(&mut dots, &input.pointer, SIM_DT);
        assert_eq!(dots[0].vel, Vec2::ZERO);
        assert_eq!(dots[1].vel, Vec2::ZERO);
    }

    #[test]
    fn test_coarse_pointer_reaches_further() {
        // 170px is outside the fine radius (160) but inside the coarse one (192)
        let mut fine = vec![still_dot(270.0, 100.0)];
        let mut coarse = fine.clone();
        let p = input_with_pointer(100.0, 100.0, PointerKind::Fine).pointer;
        apply_pointer_repulsion(&mut fine, &p, SIM_DT);
        let p = input_with_pointer(100.0, 100.0, PointerKind::Coarse).pointer;
        apply_pointer_repulsion(&mut coarse, &p, SIM_DT);

        assert_eq!(fine[0].vel, Vec2::ZERO);
        assert!(coarse[0].vel.x > 0.0);
    }

    #[test]
    fn test_pointer_outside_applies_nothing() {
        let mut state = SimState::new();
        state.dots.push(still_dot(150.0, 100.0));
        let mut input = input_with_pointer(100.0, 100.0, PointerKind::Fine);
        input.pointer.inside = false;

        let mut reference = state.clone();
        tick(&mut state, &input, SIM_DT);
        tick(
            &mut reference,
            &TickInput {
                arena: Some(arena()),
                ..Default::default()
            },
            SIM_DT,
        );
        assert_eq!(state.dots, reference.dots);
    }

    #[test]
    fn test_friction_and_speed_clamp() {
        let mut d = still_dot(0.0, 0.0);
        d.vel = Vec2::new(100.0, 0.0);
        apply_friction(&mut d);
        assert!((d.vel.x - 96.5).abs() < 1e-4);

        d.vel = Vec2::new(3000.0, 4000.0);
        apply_friction(&mut d);
        assert!((d.vel.length() - MAX_SPEED).abs() < 1e-2);
        // Direction preserved
        assert!((d.vel.normalize() - Vec2::new(0.6, 0.8)).length() < 1e-4);
    }

    #[test]
    fn test_idle_drive_keeps_field_moving() {
        let mut state = SimState::new();
        state.dots.push(Dot {
            freq: 1.0,
            phase: 0.5,
            ..still_dot(400.0, 300.0)
        });
        let input = TickInput {
            arena: Some(arena()),
            ..Default::default()
        };
        for _ in 0..30 {
            tick(&mut state, &input, SIM_DT);
        }
        assert!(state.dots[0].pos.distance(Vec2::new(400.0, 300.0)) > 0.5);
    }

    #[test]
    fn test_zero_frequency_dot_drifts_straight_down() {
        let mut state = SimState::new();
        state.dots.push(still_dot(400.0, 300.0));
        let input = TickInput {
            arena: Some(arena()),
            ..Default::default()
        };
        for _ in 0..60 {
            tick(&mut state, &input, SIM_DT);
        }
        let d = &state.dots[0];
        assert_eq!(d.pos.x, 400.0);
        assert_eq!(d.vel.x, 0.0);
        assert!(d.vel.y > 0.0);
        assert!(d.pos.y > 300.0);
    }

    #[test]
    fn test_determinism() {
        use rand::SeedableRng;
        use rand_pcg::Pcg32;

        let mut state1 = SimState::new();
        state1.spawn(3, 6, arena(), &mut Pcg32::seed_from_u64(42));
        let mut state2 = state1.clone();

        let inputs = [
            input_with_pointer(200.0, 200.0, PointerKind::Fine),
            input_with_pointer(260.0, 240.0, PointerKind::Coarse),
            TickInput {
                arena: Some(arena()),
                ..Default::default()
            },
        ];
        for _ in 0..20 {
            for input in &inputs {
                tick(&mut state1, input, SIM_DT);
                tick(&mut state2, input, SIM_DT);
            }
        }
        assert_eq!(state1.dots, state2.dots);
    }
}
