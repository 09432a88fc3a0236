//! Wall-clock accounting for one session: elapsed time across pauses.
//!
//! Persisted durations always come from these timestamps at finalize time,
//! never from accumulated display ticks, so missed ticks cannot drift them.

use crate::error::{Result, TrackError};

/// Final time totals of a session, whole seconds (floored).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSummary {
    pub total_elapsed_seconds: i64,
    pub active_seconds: i64,
    pub pause_count: u32,
    pub pause_duration_seconds: i64,
}

/// Start/pause bookkeeping in epoch milliseconds.
///
/// `pause_started_at_ms` is `Some` exactly while paused; `total_pause_ms`
/// only grows, and only when an open pause interval is folded shut.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionClock {
    started_at_ms: Option<i64>,
    pause_started_at_ms: Option<i64>,
    total_pause_ms: i64,
    pause_count: u32,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now_ms: i64) {
        *self = Self {
            started_at_ms: Some(now_ms),
            ..Self::default()
        };
    }

    pub fn is_paused(&self) -> bool {
        self.pause_started_at_ms.is_some()
    }

    pub fn pause_count(&self) -> u32 {
        self.pause_count
    }

    pub fn pause(&mut self, now_ms: i64) -> Result<()> {
        if self.started_at_ms.is_none() || self.is_paused() {
            return Err(TrackError::InvalidTransition("clock pause while not running"));
        }
        self.pause_started_at_ms = Some(now_ms);
        self.pause_count += 1;
        Ok(())
    }

    pub fn resume(&mut self, now_ms: i64) -> Result<()> {
        let Some(pause_started) = self.pause_started_at_ms.take() else {
            return Err(TrackError::InvalidTransition("clock resume while not paused"));
        };
        self.total_pause_ms += now_ms - pause_started;
        Ok(())
    }

    /// Active (non-paused) milliseconds so far, for live display.
    ///
    /// While paused the value is frozen at the instant the pause began, so a
    /// display querying it mid-pause does not creep forward.
    pub fn elapsed_active_ms(&self, now_ms: i64) -> i64 {
        let Some(started) = self.started_at_ms else {
            return 0;
        };
        let effective_now = self.pause_started_at_ms.unwrap_or(now_ms);
        (effective_now - started - self.total_pause_ms).max(0)
    }

    /// Fold any open pause interval and compute the final totals.
    ///
    /// `active_seconds` is clamped at zero: clock skew or a pause/resume
    /// right at a session boundary could otherwise produce a small negative.
    pub fn finalize(&mut self, now_ms: i64) -> ClockSummary {
        if let Some(pause_started) = self.pause_started_at_ms.take() {
            self.total_pause_ms += now_ms - pause_started;
        }

        let started = self.started_at_ms.unwrap_or(now_ms);
        let total_elapsed_seconds = ((now_ms - started) / 1000).max(0);
        let pause_duration_seconds = self.total_pause_ms / 1000;
        ClockSummary {
            total_elapsed_seconds,
            active_seconds: (total_elapsed_seconds - pause_duration_seconds).max(0),
            pause_count: self.pause_count,
            pause_duration_seconds,
        }
    }
}
