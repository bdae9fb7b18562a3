//! Server clock
//!
//! Millisecond timestamps that never go backwards, even if the wall clock does.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Shared monotonic millisecond clock
#[derive(Debug, Clone, Default)]
pub struct MonotonicClock {
    last: Arc<AtomicI64>,
}

impl MonotonicClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in milliseconds since the Unix epoch, clamped to be
    /// no earlier than any value this clock has already returned
    pub fn now_millis(&self) -> i64 {
        self.observe(chrono::Utc::now().timestamp_millis())
    }

    fn observe(&self, wall: i64) -> i64 {
        let previous = self.last.fetch_max(wall, Ordering::SeqCst);
        previous.max(wall)
    }
}
