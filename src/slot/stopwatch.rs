//! Cumulative stopwatch for per-slot elapsed time.

use std::time::{Duration, Instant};

/// A stopwatch that accumulates across any number of start/stop cycles.
///
/// Stopping never resets the total. Starting a running stopwatch and stopping
/// a stopped one are no-ops.
#[derive(Clone, Debug, Default)]
pub struct Stopwatch {
    started: Option<Instant>,
    accumulated: Duration,
    intervals: u32,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.accumulated += started.elapsed();
            self.intervals += 1;
        }
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Total time across all completed intervals plus the running one.
    pub fn elapsed(&self) -> Duration {
        match self.started {
            Some(started) => self.accumulated + started.elapsed(),
            None => self.accumulated,
        }
    }

    /// Number of completed start/stop intervals.
    pub fn intervals(&self) -> u32 {
        self.intervals
    }
}
