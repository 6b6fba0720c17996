// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time source for flush ageing
//!
//! Buffers remember when they last flushed; `max_time_between_flushes`
//! compares that against `Clock::now` so tests can age a stream without
//! sleeping.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Reads the instant used to stamp and age stream flushes
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Monotonic wall time for real runs
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Starts at creation and only moves when advanced
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<Instant>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Age every buffer stamped with this clock by `duration`
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
