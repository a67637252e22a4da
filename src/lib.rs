//! Color Cluster - a color-sorting particle puzzle
//!
//! Core modules:
//! - `sim`: Simulation state, fixed-step physics, and cluster win detection
//! - `engine`: Accumulator-driven game loop around an injected frame scheduler
//! - `settings`: Palette and dots-per-color preferences

pub mod engine;
pub mod settings;
pub mod sim;

pub use engine::{ClusterGame, FrameReport, FrameScheduler, FrameSink, ManualScheduler};
pub use settings::{Palette, Rgb, Settings, SettingsError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;
    /// Accumulator cap in seconds (a long stall never turns into a tick burst)
    pub const MAX_FRAME_ACCUMULATOR: f32 = 0.25;

    /// Dot diameter in pixels
    pub const DOT_SIZE: f32 = 20.0;
    /// Dot radius, used for wall clamping
    pub const DOT_RADIUS: f32 = DOT_SIZE / 2.0;

    /// Pointer repulsion radius for fine (mouse/pen) input
    pub const HOVER_RADIUS: f32 = 160.0;
    /// Pointer repulsion strength at zero distance
    pub const STRENGTH: f32 = 3.0;
    /// Converts repulsion strength into velocity change per second
    pub const IMPULSE_SCALE: f32 = 500.0;
    /// Coarse (touch) input reaches further...
    pub const COARSE_RADIUS_FACTOR: f32 = 1.2;
    /// ...but pushes softer
    pub const COARSE_SCALE_FACTOR: f32 = 0.7;
    /// Pointer closer than this applies no force
    pub const POINTER_DEAD_ZONE: f32 = 0.0001;

    /// Fraction of overlap corrected per collision
    pub const COLLISION_PUSH: f32 = 0.5;
    /// Velocity impulse per pixel of corrected overlap
    pub const COLLISION_IMPULSE: f32 = 5.0;

    /// Velocity fraction removed every tick
    pub const FRICTION: f32 = 0.035;
    /// Wall restitution (inelastic)
    pub const BOUNCE: f32 = 0.82;
    /// Hard speed limit (pixels/s)
    pub const MAX_SPEED: f32 = 1200.0;

    /// Idle oscillation force
    pub const IDLE_FORCE: f32 = 220.0;
    /// Idle oscillation frequency range (Hz)
    pub const IDLE_FREQ_MIN: f32 = 0.6;
    pub const IDLE_FREQ_MAX: f32 = 1.2;

    /// Spawn inset from the arena walls
    pub const SPAWN_PADDING: f32 = 24.0;
    /// Extra inset at the bottom edge when spawning
    pub const SPAWN_BOTTOM_INSET: f32 = 2.0;
    /// Initial speed range per axis
    pub const SPAWN_VELOCITY: f32 = 80.0;

    /// Max distance of a dot from its own color's centroid
    pub const CLUSTER_RADIUS: f32 = 80.0;
    /// Gap subtracted from the cluster radius for intrusion checks
    pub const EXCLUSION_MARGIN: f32 = 6.0;
    /// Seconds of session time between cluster evaluations
    pub const CLUSTER_CHECK_INTERVAL: f32 = 0.2;

    /// Dots-per-color bounds enforced before a session starts
    pub const MIN_DOTS_PER_COLOR: u32 = 2;
    pub const MAX_DOTS_PER_COLOR: u32 = 100;
    pub const DEFAULT_DOTS_PER_COLOR: u32 = 4;
}

/// Clamp a requested dots-per-color count into the playable range
#[inline]
pub fn clamp_dots_per_color(n: i64) -> u32 {
    n.clamp(
        consts::MIN_DOTS_PER_COLOR as i64,
        consts::MAX_DOTS_PER_COLOR as i64,
    ) as u32
}
