//! Simulated clock.
//!
//! Time only moves when a tick (or the driver) says so. The clock is an
//! injected collaborator, never a process-wide singleton, so backtests stay
//! reproducible.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    now: DateTime<Utc>,
}

impl SimClock {
    /// Starts at the Unix epoch until the first tick advances it.
    pub fn new() -> Self {
        Self {
            now: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn set_time(&mut self, time: DateTime<Utc>) {
        self.now = time;
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}
