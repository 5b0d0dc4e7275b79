//! Monotonic clock adapter.
//!
//! Implements [`TimePort`] with `std::time::Instant` for reads and the
//! `async-io-mini` reactor for sleeps, so waiting tasks park instead of
//! spinning.

use core::time::Duration;
use std::time::Instant;

use crate::app::ports::TimePort;

/// Milliseconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl TimePort for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    async fn sleep_until(&self, deadline_ms: u64) {
        let now = self.now_ms();
        if deadline_ms > now {
            async_io_mini::Timer::after(Duration::from_millis(deadline_ms - now)).await;
        }
    }
}
