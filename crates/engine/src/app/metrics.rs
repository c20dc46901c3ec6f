use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub frame_time_ms: f32,
    pub worst_frame_time_ms: f32,
    /// Frames whose delta was cut down to the configured maximum.
    pub clamped_frames: u32,
}

/// Latest published snapshot, shared between the loop and observers.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *self
            .latest
            .read()
            .unwrap_or_else(|poisoned| recover_poisoned("read", poisoned))
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        *self
            .latest
            .write()
            .unwrap_or_else(|poisoned| recover_poisoned("write", poisoned)) = snapshot;
    }
}

fn recover_poisoned<G>(operation: &'static str, poisoned: PoisonError<G>) -> G {
    warn!(operation, "metrics_lock_poisoned");
    poisoned.into_inner()
}

/// Running totals for one logging interval.
#[derive(Debug, Default, Clone, Copy)]
struct FrameTotals {
    frames: u32,
    clamped_frames: u32,
    frame_time: Duration,
    worst_frame_time: Duration,
}

impl FrameTotals {
    fn add(&mut self, frame_dt: Duration, was_clamped: bool) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time = self.frame_time.saturating_add(frame_dt);
        self.worst_frame_time = self.worst_frame_time.max(frame_dt);
        self.clamped_frames = self.clamped_frames.saturating_add(u32::from(was_clamped));
    }

    fn summarize(&self, elapsed: Duration) -> LoopMetricsSnapshot {
        let mean_ms = match self.frames {
            0 => 0.0,
            frames => self.frame_time.as_secs_f32() * 1000.0 / frames as f32,
        };
        LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed.as_secs_f32().max(f32::EPSILON),
            frame_time_ms: mean_ms,
            worst_frame_time_ms: self.worst_frame_time.as_secs_f32() * 1000.0,
            clamped_frames: self.clamped_frames,
        }
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval: Duration,
    interval_start: Instant,
    totals: FrameTotals,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            interval_start: Instant::now(),
            totals: FrameTotals::default(),
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration, was_clamped: bool) {
        self.totals.add(frame_dt, was_clamped);
    }

    /// Closes the interval once it has run its length, starting a fresh one.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }
        let totals = std::mem::take(&mut self.totals);
        self.interval_start = now;
        Some(totals.summarize(elapsed))
    }
}
