//! Property tests for the physics stepper: boundedness, speed limit and
//! overlap reduction hold for arbitrary spawns, arenas and pointer paths.

use color_cluster::consts::*;
use color_cluster::sim::{
    Arena, ColorKey, Dot, PointerKind, PointerState, SimState, TickInput, tick,
};
use glam::Vec2;
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

fn pointer_strategy() -> impl Strategy<Value = PointerState> {
    (-200.0f32..1400.0, -200.0f32..1100.0, any::<bool>(), any::<bool>()).prop_map(
        |(x, y, inside, coarse)| PointerState {
            pos: Vec2::new(x, y),
            inside,
            kind: if coarse {
                PointerKind::Coarse
            } else {
                PointerKind::Fine
            },
        },
    )
}

fn arena_strategy() -> impl Strategy<Value = Arena> {
    (40.0f32..1200.0, 40.0f32..900.0).prop_map(|(w, h)| Arena::new(w, h))
}

fn assert_bounded(state: &SimState, arena: Arena) -> Result<(), TestCaseError> {
    for d in &state.dots {
        prop_assert!(
            d.pos.x >= DOT_RADIUS && d.pos.x <= arena.width - DOT_RADIUS,
            "x out of bounds: {} in {:?}",
            d.pos.x,
            arena
        );
        prop_assert!(
            d.pos.y >= DOT_RADIUS && d.pos.y <= arena.height - DOT_RADIUS,
            "y out of bounds: {} in {:?}",
            d.pos.y,
            arena
        );
        prop_assert!(
            d.vel.length() <= MAX_SPEED + 0.01,
            "speed {} over limit",
            d.vel.length()
        );
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn dots_stay_inside_live_arena(
        seed in any::<u64>(),
        colors in 1usize..5,
        per_color in 2u32..12,
        spawn_arena in arena_strategy(),
        resized in arena_strategy(),
        pointers in prop::collection::vec(pointer_strategy(), 1..40),
    ) {
        let mut state = SimState::new();
        state.spawn(colors, per_color, spawn_arena, &mut Pcg32::seed_from_u64(seed));

        // Run the path once in the spawn arena, then again after a resize
        for arena in [spawn_arena, resized] {
            for pointer in &pointers {
                let input = TickInput { pointer: *pointer, arena: Some(arena) };
                tick(&mut state, &input, SIM_DT);
                assert_bounded(&state, arena)?;
            }
        }
    }

    #[test]
    fn speed_clamp_survives_pointer_hammering(
        seed in any::<u64>(),
        per_color in 2u32..20,
    ) {
        let arena = Arena::new(400.0, 300.0);
        let mut state = SimState::new();
        state.spawn(2, per_color, arena, &mut Pcg32::seed_from_u64(seed));
        // Blow every dot up to an absurd speed before stepping
        for d in &mut state.dots {
            d.vel = Vec2::new(50_000.0, -30_000.0);
        }
        let input = TickInput {
            pointer: PointerState {
                pos: arena.center(),
                inside: true,
                kind: PointerKind::Fine,
            },
            arena: Some(arena),
        };
        for _ in 0..30 {
            tick(&mut state, &input, SIM_DT);
            assert_bounded(&state, arena)?;
        }
    }
}

fn total_overlap(dots: &[Dot]) -> f32 {
    let mut sum = 0.0;
    for (i, a) in dots.iter().enumerate() {
        for b in &dots[i + 1..] {
            sum += (DOT_SIZE - a.pos.distance(b.pos)).max(0.0);
        }
    }
    sum
}

#[test]
fn overlapping_pair_separates() {
    let arena = Arena::new(800.0, 600.0);
    let mut state = SimState::new();
    state.dots = vec![
        Dot::at(0, ColorKey(0), Vec2::new(400.0, 300.0)),
        Dot::at(1, ColorKey(1), Vec2::new(405.0, 300.0)),
    ];
    let input = TickInput {
        arena: Some(arena),
        ..Default::default()
    };
    for _ in 0..120 {
        tick(&mut state, &input, SIM_DT);
    }
    let dist = state.dots[0].pos.distance(state.dots[1].pos);
    assert!(dist >= DOT_SIZE - 0.5, "pair still overlapping at {}", dist);
}

#[test]
fn piled_dots_spread_out() {
    let arena = Arena::new(800.0, 600.0);
    let mut rng = Pcg32::seed_from_u64(2024);
    let mut state = SimState::new();
    state.dots = (0..16)
        .map(|i| Dot {
            phase: rng.random_range(0.0..std::f32::consts::TAU),
            freq: rng.random_range(IDLE_FREQ_MIN..IDLE_FREQ_MAX),
            ..Dot::at(
                i,
                ColorKey((i % 4) as u16),
                arena.center() + Vec2::new(rng.random_range(-8.0..8.0), rng.random_range(-8.0..8.0)),
            )
        })
        .collect();

    let before = total_overlap(&state.dots);
    let input = TickInput {
        arena: Some(arena),
        ..Default::default()
    };
    for _ in 0..300 {
        tick(&mut state, &input, SIM_DT);
    }
    let after = total_overlap(&state.dots);
    assert!(
        after < before * 0.25,
        "overlap went from {} to {}",
        before,
        after
    );
}
