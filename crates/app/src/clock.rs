//! Engine clock.
//!
//! Wall-clock timestamps derived from the tokio monotonic clock, so that a
//! paused test runtime moves timestamps and timers together.

use tokio::time::Instant;

use tidyhub_domain::time::{Timestamp, now};

#[derive(Debug, Clone, Copy)]
pub struct Clock {
    wall: Timestamp,
    origin: Instant,
}

impl Clock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            wall: now(),
            origin: Instant::now(),
        }
    }

    #[must_use]
    pub fn now(&self) -> Timestamp {
        let elapsed = chrono::Duration::from_std(self.origin.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.wall + elapsed
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
