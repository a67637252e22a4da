//! Simulation state and core types
//!
//! Pure data: dots, arena bounds, pointer input and the session clock.
//! All behavior lives in `tick`, `collision` and `cluster`.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Palette index of a dot's color (the color value itself belongs to the renderer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColorKey(pub u16);

impl ColorKey {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Playable rectangle in arena-local pixels, origin at top-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Whether a point lies inside the arena rectangle
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.width && p.y <= self.height
    }
}

/// Input modality, affects pointer repulsion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointerKind {
    /// Mouse or pen
    #[default]
    Fine,
    /// Touch
    Coarse,
}

impl PointerKind {
    /// Map a DOM `pointerType` string
    pub fn from_pointer_type(s: &str) -> Self {
        match s {
            "touch" => PointerKind::Coarse,
            _ => PointerKind::Fine,
        }
    }

    /// Repulsion radius for this modality
    pub fn radius(self) -> f32 {
        match self {
            PointerKind::Fine => HOVER_RADIUS,
            PointerKind::Coarse => HOVER_RADIUS * COARSE_RADIUS_FACTOR,
        }
    }

    /// Impulse scale for this modality
    pub fn impulse_scale(self) -> f32 {
        match self {
            PointerKind::Fine => IMPULSE_SCALE,
            PointerKind::Coarse => IMPULSE_SCALE * COARSE_SCALE_FACTOR,
        }
    }
}

/// Latest pointer sample
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerState {
    pub pos: Vec2,
    pub inside: bool,
    pub kind: PointerKind,
}

/// A colored dot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dot {
    pub id: u32,
    pub color: ColorKey,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Idle oscillation phase in [0, 2π)
    pub phase: f32,
    /// Idle oscillation frequency (Hz)
    pub freq: f32,
}

impl Dot {
    /// A dot at rest with zero idle frequency and phase (test fixtures, tooling).
    /// The idle drive still pushes it at a constant `IDLE_FORCE` along +y.
    pub fn at(id: u32, color: ColorKey, pos: Vec2) -> Self {
        Self {
            id,
            color,
            pos,
            vel: Vec2::ZERO,
            phase: 0.0,
            freq: 0.0,
        }
    }
}

/// Read-only view of a dot handed to renderers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DotView {
    pub id: u32,
    pub color: ColorKey,
    pub pos: Vec2,
}

impl From<&Dot> for DotView {
    fn from(d: &Dot) -> Self {
        Self {
            id: d.id,
            color: d.color,
            pos: d.pos,
        }
    }
}

/// Complete simulation state for one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimState {
    /// All dots, grouped by color in spawn order
    pub dots: Vec<Dot>,
    /// Number of color groups in the palette
    pub color_count: usize,
    /// Session clock in simulated seconds
    pub time: f32,
    /// Ticks run this session
    pub time_ticks: u64,
    /// Next dot ID (survives respawns so ids are never reused)
    next_id: u32,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new dot ID
    pub fn next_dot_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Replace every dot with a fresh session's worth and reset the clock
    ///
    /// `dots_per_color` is trusted; callers clamp it with
    /// [`crate::clamp_dots_per_color`].
    pub fn spawn<R: Rng>(
        &mut self,
        color_count: usize,
        dots_per_color: u32,
        arena: Arena,
        rng: &mut R,
    ) {
        let (x_min, x_max) = spawn_range(arena.width, SPAWN_PADDING, SPAWN_PADDING);
        let (y_min, y_max) = spawn_range(
            arena.height,
            SPAWN_PADDING,
            SPAWN_PADDING + SPAWN_BOTTOM_INSET,
        );

        let mut dots = Vec::with_capacity(color_count * dots_per_color as usize);
        for color in 0..color_count {
            for _ in 0..dots_per_color {
                let id = self.next_dot_id();
                dots.push(Dot {
                    id,
                    color: ColorKey(color as u16),
                    pos: Vec2::new(uniform(rng, x_min, x_max), uniform(rng, y_min, y_max)),
                    vel: Vec2::new(
                        rng.random_range(-SPAWN_VELOCITY..SPAWN_VELOCITY),
                        rng.random_range(-SPAWN_VELOCITY..SPAWN_VELOCITY),
                    ),
                    phase: rng.random_range(0.0..std::f32::consts::TAU),
                    freq: rng.random_range(IDLE_FREQ_MIN..IDLE_FREQ_MAX),
                });
            }
        }

        self.dots = dots;
        self.color_count = color_count;
        self.time = 0.0;
        self.time_ticks = 0;
    }

    /// Copy positions into a render snapshot, reusing the buffer
    pub fn write_snapshot(&self, out: &mut Vec<DotView>) {
        out.clear();
        out.extend(self.dots.iter().map(DotView::from));
    }
}

/// Spawn interval along one axis; collapses to the middle when the arena is too small
fn spawn_range(extent: f32, low_inset: f32, high_inset: f32) -> (f32, f32) {
    let lo = low_inset;
    let hi = extent - high_inset;
    if hi > lo {
        (lo, hi)
    } else {
        let mid = extent * 0.5;
        (mid, mid)
    }
}

/// Sample from the open interval `(lo, hi)`, or `lo` when it is empty
fn uniform<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi <= lo {
        return lo;
    }
    loop {
        let v = rng.random_range(lo..hi);
        if v > lo {
            return v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_spawn_counts_and_bounds() {
        let mut state = SimState::new();
        let mut rng = Pcg32::seed_from_u64(7);
        let arena = Arena::new(800.0, 560.0);
        state.spawn(3, 5, arena, &mut rng);

        assert_eq!(state.dots.len(), 15);
        assert_eq!(state.color_count, 3);
        for color in 0..3u16 {
            let n = state.dots.iter().filter(|d| d.color == ColorKey(color)).count();
            assert_eq!(n, 5);
        }
        for d in &state.dots {
            assert!(d.pos.x > SPAWN_PADDING && d.pos.x < arena.width - SPAWN_PADDING);
            assert!(
                d.pos.y > SPAWN_PADDING
                    && d.pos.y < arena.height - SPAWN_PADDING - SPAWN_BOTTOM_INSET
            );
            assert!(d.vel.x.abs() <= SPAWN_VELOCITY && d.vel.y.abs() <= SPAWN_VELOCITY);
            assert!((0.0..std::f32::consts::TAU).contains(&d.phase));
            assert!((IDLE_FREQ_MIN..IDLE_FREQ_MAX).contains(&d.freq));
        }
    }

    #[test]
    fn test_respawn_replaces_dots_without_reusing_ids() {
        let mut state = SimState::new();
        let mut rng = Pcg32::seed_from_u64(1);
        let arena = Arena::new(400.0, 400.0);

        state.spawn(2, 3, arena, &mut rng);
        let first: Vec<u32> = state.dots.iter().map(|d| d.id).collect();
        state.time = 12.0;

        state.spawn(2, 3, arena, &mut rng);
        assert_eq!(state.dots.len(), 6);
        assert_eq!(state.time, 0.0);
        assert!(state.dots.iter().all(|d| !first.contains(&d.id)));
    }

    #[test]
    fn test_spawn_tiny_arena_collapses_to_center() {
        let mut state = SimState::new();
        let mut rng = Pcg32::seed_from_u64(3);
        state.spawn(1, 4, Arena::new(30.0, 30.0), &mut rng);
        for d in &state.dots {
            assert_eq!(d.pos, Vec2::new(15.0, 15.0));
        }
    }

    #[test]
    fn test_spawn_is_reproducible_per_seed() {
        let arena = Arena::new(640.0, 480.0);
        let mut a = SimState::new();
        let mut b = SimState::new();
        a.spawn(4, 4, arena, &mut Pcg32::seed_from_u64(99));
        b.spawn(4, 4, arena, &mut Pcg32::seed_from_u64(99));
        assert_eq!(a.dots, b.dots);
    }

    #[test]
    fn test_pointer_kind_modifiers() {
        assert_eq!(PointerKind::from_pointer_type("touch"), PointerKind::Coarse);
        assert_eq!(PointerKind::from_pointer_type("mouse"), PointerKind::Fine);
        assert_eq!(PointerKind::from_pointer_type("pen"), PointerKind::Fine);
        assert!(PointerKind::Coarse.radius() > PointerKind::Fine.radius());
        assert!(PointerKind::Coarse.impulse_scale() < PointerKind::Fine.impulse_scale());
    }
}
