//! Heat stopwatch.
//!
//! The clock knows nothing about lanes or heats. It accumulates running time in
//! milliseconds from a [`TimeSource`] and exposes it on demand; any periodic
//! display refresh happens outside and is never a source of truth.

use serde::Serialize;

use crate::time::{MonotonicTime, TimeSource};

/// Stopwatch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    /// Zeroed: never started, or reset.
    Stopped,
    Running,
    /// Frozen at a non-zero or zero reading; `start` resumes.
    Paused,
}

/// A pausable stopwatch over a monotonic source.
#[derive(Debug, Clone)]
pub struct Clock<T: TimeSource = MonotonicTime> {
    source: T,
    state: ClockState,
    /// Running time banked before the current run segment.
    banked_ms: u64,
    /// Source reading when the current run segment began.
    segment_start: u64,
}

impl<T: TimeSource> Clock<T> {
    pub const fn new(source: T) -> Self {
        Self {
            source,
            state: ClockState::Stopped,
            banked_ms: 0,
            segment_start: 0,
        }
    }

    pub const fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Starts or resumes the clock. Returns `false` if it was already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.segment_start = self.source.now_ms();
        self.state = ClockState::Running;
        true
    }

    /// Freezes the reading. Returns `false` if the clock was not running.
    pub fn pause(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.banked_ms = self.elapsed_ms();
        self.state = ClockState::Paused;
        true
    }

    /// Zeroes the reading and stops the clock.
    pub fn reset(&mut self) {
        self.banked_ms = 0;
        self.segment_start = 0;
        self.state = ClockState::Stopped;
    }

    /// Elapsed running time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        match self.state {
            ClockState::Running => {
                let now = self.source.now_ms();
                self.banked_ms + now.saturating_sub(self.segment_start)
            }
            ClockState::Stopped | ClockState::Paused => self.banked_ms,
        }
    }
}
