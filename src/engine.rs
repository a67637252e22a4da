//! Fixed-step game loop driver
//!
//! Owns the simulation exclusively. The host feeds it frame callbacks with
//! wall-clock deltas; the driver converts them into whole `SIM_DT` ticks with
//! an accumulator, checks for a win after each batch, and asks the injected
//! [`FrameScheduler`] for the next callback until the session ends.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::clamp_dots_per_color;
use crate::consts::*;
use crate::settings::Settings;
use crate::sim::{
    Arena, ClusterClassifier, DotView, PointerKind, PointerState, SimState, TickInput, tick,
};

/// Identifies one requested frame callback
///
/// A callback delivering a ticket other than the one currently pending is
/// stale (cancelled or superseded) and is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameTicket(pub u64);

/// Host capability for "call me again next frame"
pub trait FrameScheduler {
    /// Arrange for [`ClusterGame::frame`] to be called with `ticket`
    fn request_frame(&mut self, ticket: FrameTicket);
    /// Best-effort cancel of a previously requested frame
    fn cancel_frame(&mut self, ticket: FrameTicket);
}

/// Receives the dot snapshot after every tick
pub trait FrameSink {
    fn present(&mut self, dots: &[DotView]);
}

impl<F: FnMut(&[DotView])> FrameSink for F {
    fn present(&mut self, dots: &[DotView]) {
        self(dots)
    }
}

/// Sink that discards snapshots
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn present(&mut self, _dots: &[DotView]) {}
}

/// Scheduler for headless hosts and tests: requests queue up until pumped
#[derive(Debug, Default)]
pub struct ManualScheduler {
    queue: Vec<FrameTicket>,
    /// Total frames requested
    pub requested: u32,
    /// Total cancellations received
    pub cancelled: u32,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the oldest queued callback
    pub fn next_ready(&mut self) -> Option<FrameTicket> {
        if self.queue.is_empty() {
            None
        } else {
            Some(self.queue.remove(0))
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self, ticket: FrameTicket) {
        self.requested += 1;
        self.queue.push(ticket);
    }

    fn cancel_frame(&mut self, ticket: FrameTicket) {
        self.cancelled += 1;
        self.queue.retain(|t| *t != ticket);
    }
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session started yet
    Idle,
    /// Ticking
    Running,
    /// Halted by the caller; state kept for `resume`
    Stopped,
    /// Win latched; no further ticks this session
    Completed,
}

/// What happened during one frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    /// Fixed ticks run this frame (0..=MAX_SUBSTEPS)
    pub ticks: u32,
    /// The session was won during this frame (fires once per session)
    pub completed: bool,
}

/// The puzzle engine: simulation, classifier and loop state for one player
pub struct ClusterGame<S: FrameScheduler> {
    scheduler: S,
    state: SimState,
    classifier: ClusterClassifier,
    rng: Pcg32,
    palette: Vec<String>,
    dots_per_color: u32,
    arena: Option<Arena>,
    pointer: PointerState,
    accumulator: f32,
    phase: SessionPhase,
    pending: Option<FrameTicket>,
    next_ticket: u64,
    snapshot: Vec<DotView>,
}

impl<S: FrameScheduler> ClusterGame<S> {
    /// Create an idle engine configured with the default palette
    pub fn new(scheduler: S, seed: u64) -> Self {
        let defaults = Settings::default();
        Self {
            scheduler,
            state: SimState::new(),
            classifier: ClusterClassifier::default(),
            rng: Pcg32::seed_from_u64(seed),
            palette: defaults.colors,
            dots_per_color: defaults.dots_per_color,
            arena: None,
            pointer: PointerState::default(),
            accumulator: 0.0,
            phase: SessionPhase::Idle,
            pending: None,
            next_ticket: 0,
            snapshot: Vec::new(),
        }
    }

    /// Set palette and dots-per-color for the next `start`
    ///
    /// The count is clamped into the playable range here; an empty palette
    /// yields an empty (never winnable) session.
    pub fn configure<I, C>(&mut self, palette: I, dots_per_color: u32)
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.palette = palette.into_iter().map(Into::into).collect();
        self.dots_per_color = clamp_dots_per_color(dots_per_color as i64);
        if self.palette.is_empty() {
            log::warn!("Configured an empty palette; sessions will have no dots");
        }
    }

    /// Apply persisted settings (palette fallback and clamping included)
    pub fn configure_from(&mut self, settings: &Settings) {
        let applied = settings.applied();
        self.configure(applied.colors, applied.dots_per_color);
    }

    /// Spawn a fresh session and begin ticking
    ///
    /// Calling this while a session is running restarts it cleanly.
    pub fn start(&mut self, arena: Arena) {
        self.cancel_pending();

        self.arena = Some(arena);
        self.state.spawn(
            self.palette.len(),
            self.dots_per_color,
            arena,
            &mut self.rng,
        );
        self.classifier.reset();
        self.accumulator = 0.0;
        self.phase = SessionPhase::Running;
        self.state.write_snapshot(&mut self.snapshot);

        log::info!(
            "Session started: {} colors x {} dots in {}x{}",
            self.palette.len(),
            self.dots_per_color,
            arena.width,
            arena.height
        );
        self.request_next();
    }

    /// Halt ticking; safe to call any number of times
    pub fn stop(&mut self) {
        self.cancel_pending();
        if self.phase == SessionPhase::Running {
            self.phase = SessionPhase::Stopped;
            log::info!("Session stopped at {:.2}s", self.state.time);
        }
    }

    /// Continue a stopped, unfinished session in place
    ///
    /// Time spent stopped is not caught up. Returns false if there is
    /// nothing to resume.
    pub fn resume(&mut self) -> bool {
        if self.phase != SessionPhase::Stopped {
            return false;
        }
        self.accumulator = 0.0;
        self.phase = SessionPhase::Running;
        log::info!("Session resumed at {:.2}s", self.state.time);
        self.request_next();
        true
    }

    /// Latest pointer position in arena coordinates. Positions off the live
    /// arena (or with no arena) count as outside and repel nothing.
    pub fn pointer_move(&mut self, x: f32, y: f32, kind: PointerKind) {
        let pos = glam::Vec2::new(x, y);
        self.pointer = PointerState {
            pos,
            inside: self.arena.is_some_and(|a| a.contains(pos)),
            kind,
        };
    }

    pub fn pointer_leave(&mut self) {
        self.pointer.inside = false;
    }

    /// Update the live arena bounds (`None` while the surface is unavailable)
    pub fn set_arena(&mut self, arena: Option<Arena>) {
        self.arena = arena;
    }

    /// Handle a frame callback carrying `delta` seconds of wall time
    pub fn frame<K: FrameSink + ?Sized>(
        &mut self,
        ticket: FrameTicket,
        delta: f32,
        sink: &mut K,
    ) -> FrameReport {
        if self.pending != Some(ticket) {
            log::trace!("Ignoring stale frame {:?}", ticket);
            return FrameReport::default();
        }
        self.pending = None;
        if self.phase != SessionPhase::Running {
            return FrameReport::default();
        }

        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        self.accumulator = (self.accumulator + delta).min(MAX_FRAME_ACCUMULATOR);

        // Input is latched once per frame; every tick in the batch sees the same sample
        let input = TickInput {
            pointer: self.pointer,
            arena: self.arena,
        };

        let mut report = FrameReport::default();
        while self.accumulator >= SIM_DT && report.ticks < MAX_SUBSTEPS {
            tick(&mut self.state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            report.ticks += 1;

            self.state.write_snapshot(&mut self.snapshot);
            sink.present(&self.snapshot);
        }
        log::trace!(
            "Frame: {} ticks, {:.4}s carried",
            report.ticks,
            self.accumulator
        );

        if report.ticks > 0
            && self
                .classifier
                .check_win(self.state.time, &self.state.dots, self.state.color_count)
            && self.classifier.latch_win()
        {
            self.phase = SessionPhase::Completed;
            report.completed = true;
            log::info!("Sorted! Session completed at {:.2}s", self.state.time);
            return report;
        }

        self.request_next();
        report
    }

    /// Current dot positions and color keys
    pub fn snapshot(&self) -> &[DotView] {
        &self.snapshot
    }

    /// Color identifiers for the configured palette, indexed by `ColorKey`
    pub fn palette(&self) -> &[String] {
        &self.palette
    }

    pub fn dots_per_color(&self) -> u32 {
        self.dots_per_color
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn has_won(&self) -> bool {
        self.classifier.has_won()
    }

    /// Simulated seconds elapsed this session
    pub fn session_time(&self) -> f32 {
        self.state.time
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    /// Seconds of wall time waiting to become ticks
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    fn request_next(&mut self) {
        self.next_ticket += 1;
        let ticket = FrameTicket(self.next_ticket);
        self.pending = Some(ticket);
        self.scheduler.request_frame(ticket);
    }

    fn cancel_pending(&mut self) {
        if let Some(ticket) = self.pending.take() {
            self.scheduler.cancel_frame(ticket);
        }
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut SimState {
        &mut self.state
    }
}

impl ClusterGame<ManualScheduler> {
    /// Deliver the next queued frame, if any
    pub fn pump<K: FrameSink + ?Sized>(&mut self, delta: f32, sink: &mut K) -> Option<FrameReport> {
        let ticket = self.scheduler.next_ready()?;
        Some(self.frame(ticket, delta, sink))
    }
}
