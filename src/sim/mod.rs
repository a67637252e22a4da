//! Deterministic simulation module
//!
//! All puzzle logic lives here. This module must stay free of rendering and
//! platform dependencies:
//! - Fixed timestep only
//! - Randomness only at spawn, from a caller-supplied RNG
//! - Stable iteration order (spawn order)

pub mod cluster;
pub mod collision;
pub mod state;
pub mod tick;

pub use cluster::{ClusterClassifier, ClusterVerdict, WinLatch, color_centroids, evaluate_clusters};
pub use collision::{CollisionResult, confine_to_arena, dot_dot_collision, resolve_dot_collisions};
pub use state::{Arena, ColorKey, Dot, DotView, PointerKind, PointerState, SimState};
pub use tick::{TickInput, apply_friction, apply_idle_drive, apply_pointer_repulsion, tick};
