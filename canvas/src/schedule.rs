//! Frame scheduling and corner-update coalescing.
//!
//! The host owns the real clock and animation-frame primitive. These types only
//! decide *whether* work is due; they never sleep or spawn.

#[cfg(test)]
#[path = "schedule_test.rs"]
mod schedule_test;

use crate::geometry::Point;

/// At most one pending frame at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameScheduler {
    pending: bool,
}

impl FrameScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a frame. Returns `true` only when no frame was already pending,
    /// i.e. when the host must actually request one.
    pub fn request(&mut self) -> bool {
        let newly = !self.pending;
        self.pending = true;
        newly
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the pending frame on a tick. Returns whether one was pending.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// Drop the pending frame, e.g. when the surface goes away.
    pub fn cancel(&mut self) {
        self.pending = false;
    }
}

/// Outcome of offering a corner position to the throttle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Throttled {
    /// Enough time has passed; apply this point now.
    Commit(Point),
    /// Stored as the pending sample; flush it on the next frame.
    Deferred,
}

/// Coalesces high-frequency corner updates to one commit per interval.
///
/// Only the newest deferred sample survives; older ones in the same window are
/// overwritten, never queued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerThrottle {
    interval_ms: f64,
    last_commit_ms: Option<f64>,
    pending: Option<Point>,
}

impl CornerThrottle {
    #[must_use]
    pub fn new(interval_ms: f64) -> Self {
        Self { interval_ms, last_commit_ms: None, pending: None }
    }

    pub fn offer(&mut self, p: Point, now_ms: f64) -> Throttled {
        let due = self
            .last_commit_ms
            .is_none_or(|last| now_ms - last >= self.interval_ms);
        if due {
            self.last_commit_ms = Some(now_ms);
            self.pending = None;
            Throttled::Commit(p)
        } else {
            self.pending = Some(p);
            Throttled::Deferred
        }
    }

    /// Take the pending sample, if any, recording it as committed at `now_ms`.
    pub fn flush(&mut self, now_ms: f64) -> Option<Point> {
        let p = self.pending.take()?;
        self.last_commit_ms = Some(now_ms);
        Some(p)
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Forget both the pending sample and the commit history.
    pub fn reset(&mut self) {
        self.last_commit_ms = None;
        self.pending = None;
    }
}
