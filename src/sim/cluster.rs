//! Cluster win detection
//!
//! The puzzle is solved when every color forms one tight blob that no other
//! color intrudes on, and the blobs sit far enough apart to be unambiguous.
//! Evaluation is O(n²) across colors and dots, so [`ClusterClassifier`]
//! throttles it and caches the last verdict.

use glam::Vec2;

use super::state::{ColorKey, Dot};
use crate::consts::*;

/// Outcome of one cluster evaluation
///
/// Failures carry the first offending color (and dot) in color-then-dot order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClusterVerdict {
    /// Every color is tight, exclusive and separated
    Sorted,
    /// No dots at all; nothing to sort
    Empty,
    /// A dot strays beyond the cluster radius of its own centroid
    Loose { color: ColorKey, dot: u32 },
    /// A dot of another color sits inside this color's exclusion zone
    Intruded { color: ColorKey, intruder: u32 },
    /// Two centroids are too close to tell the clusters apart
    Crowded { a: ColorKey, b: ColorKey },
}

impl ClusterVerdict {
    pub fn is_win(&self) -> bool {
        matches!(self, ClusterVerdict::Sorted)
    }
}

/// Per-color centroids; `None` for colors with no dots
pub fn color_centroids(dots: &[Dot], color_count: usize) -> Vec<Option<Vec2>> {
    let mut sums = vec![(Vec2::ZERO, 0u32); color_count];
    for dot in dots {
        if let Some((sum, n)) = sums.get_mut(dot.color.index()) {
            *sum += dot.pos;
            *n += 1;
        }
    }
    sums.into_iter()
        .map(|(sum, n)| (n > 0).then(|| sum / n as f32))
        .collect()
}

/// Evaluate the win predicate against the current positions
///
/// Colors with no dots are vacuously satisfied: they never fail tightness,
/// exclusion or separation.
pub fn evaluate_clusters(dots: &[Dot], color_count: usize) -> ClusterVerdict {
    if dots.is_empty() {
        return ClusterVerdict::Empty;
    }

    let centroids = color_centroids(dots, color_count);
    let exclusion = CLUSTER_RADIUS - EXCLUSION_MARGIN;

    for (index, centroid) in centroids.iter().enumerate() {
        let Some(centroid) = *centroid else {
            continue;
        };
        let color = ColorKey(index as u16);

        if let Some(dot) = dots
            .iter()
            .filter(|d| d.color == color)
            .find(|d| d.pos.distance(centroid) > CLUSTER_RADIUS)
        {
            return ClusterVerdict::Loose { color, dot: dot.id };
        }

        if let Some(dot) = dots
            .iter()
            .filter(|d| d.color != color)
            .find(|d| d.pos.distance(centroid) < exclusion)
        {
            return ClusterVerdict::Intruded {
                color,
                intruder: dot.id,
            };
        }
    }

    let min_separation = CLUSTER_RADIUS * 2.0 - EXCLUSION_MARGIN;
    for (i, a) in centroids.iter().enumerate() {
        let Some(a) = *a else { continue };
        for (j, b) in centroids.iter().enumerate().skip(i + 1) {
            let Some(b) = *b else { continue };
            if a.distance(b) < min_separation {
                return ClusterVerdict::Crowded {
                    a: ColorKey(i as u16),
                    b: ColorKey(j as u16),
                };
            }
        }
    }

    ClusterVerdict::Sorted
}

/// One-shot win flag for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WinLatch {
    #[default]
    Pending,
    Signaled,
}

impl WinLatch {
    /// Flip to `Signaled`; true only on the first call
    pub fn signal(&mut self) -> bool {
        match self {
            WinLatch::Pending => {
                *self = WinLatch::Signaled;
                true
            }
            WinLatch::Signaled => false,
        }
    }

    pub fn is_signaled(&self) -> bool {
        matches!(self, WinLatch::Signaled)
    }
}

/// Throttled win checker with a per-session latch
#[derive(Debug, Clone)]
pub struct ClusterClassifier {
    interval: f32,
    last_check: Option<f32>,
    last_verdict: ClusterVerdict,
    latch: WinLatch,
}

impl Default for ClusterClassifier {
    fn default() -> Self {
        Self::new(CLUSTER_CHECK_INTERVAL)
    }
}

impl ClusterClassifier {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            last_check: None,
            last_verdict: ClusterVerdict::Empty,
            latch: WinLatch::Pending,
        }
    }

    /// Forget cached results and re-arm the latch for a new session
    pub fn reset(&mut self) {
        self.last_check = None;
        self.last_verdict = ClusterVerdict::Empty;
        self.latch = WinLatch::Pending;
    }

    /// Whether the dots currently form a winning arrangement
    ///
    /// Re-evaluates at most once per interval of `now` (session seconds);
    /// calls inside the interval return the cached answer.
    pub fn check_win(&mut self, now: f32, dots: &[Dot], color_count: usize) -> bool {
        let due = match self.last_check {
            None => true,
            Some(last) => now - last >= self.interval || now < last,
        };
        if due {
            self.last_check = Some(now);
            let verdict = evaluate_clusters(dots, color_count);
            if verdict != self.last_verdict {
                log::debug!("Cluster verdict at {:.2}s: {:?}", now, verdict);
            }
            self.last_verdict = verdict;
        }
        self.last_verdict.is_win()
    }

    /// Latch the win; true only the first time per session
    pub fn latch_win(&mut self) -> bool {
        self.latch.signal()
    }

    pub fn has_won(&self) -> bool {
        self.latch.is_signaled()
    }

    pub fn last_verdict(&self) -> ClusterVerdict {
        self.last_verdict
    }
}
