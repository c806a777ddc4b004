//! Time sources for the attempt tracker and logger.
//!
//! Windows are measured on the monotonic clock; log timestamps use the wall clock.

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    fn now_monotonic(&self) -> Instant;
    fn now_wallclock(&self) -> DateTime<Utc>;
}

/// Real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_monotonic(&self) -> Instant {
        Instant::now()
    }

    fn now_wallclock(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Both readings advance together.
#[derive(Debug)]
pub struct ManualClock {
    base_instant: Instant,
    base_wall: DateTime<Utc>,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base_instant: Instant::now(),
            base_wall: Utc::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }

    fn offset(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now_monotonic(&self) -> Instant {
        self.base_instant + self.offset()
    }

    fn now_wallclock(&self) -> DateTime<Utc> {
        // Offsets stay far below chrono's range in practice.
        let offset = chrono::Duration::from_std(self.offset()).unwrap_or(chrono::Duration::zero());
        self.base_wall + offset
    }
}
