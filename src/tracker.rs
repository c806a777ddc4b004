//! In-memory, thread-safe attempt tracker.
//! Limits capture attempts per source address within a sliding time window.

use crate::clock::{Clock, SystemClock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const DEFAULT_MAX_ATTEMPTS: usize = 10;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MAX_ADDRESSES: usize = 10_000;

type Windows = HashMap<String, VecDeque<Instant>>;

#[derive(Clone)]
pub struct AttemptTracker {
    // Map of address -> admitted attempt timestamps, oldest first
    inner: Arc<Mutex<Windows>>,
    clock: Arc<dyn Clock>,
    pub max_attempts: usize,
    pub window: Duration,
    pub max_addresses: usize,
}

impl AttemptTracker {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self::with_clock(max_attempts, window, Arc::new(SystemClock))
    }

    pub fn with_clock(max_attempts: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            clock,
            max_attempts,
            window,
            max_addresses: DEFAULT_MAX_ADDRESSES,
        }
    }

    /// Caps the number of distinct addresses held at once.
    pub fn with_max_addresses(mut self, max_addresses: usize) -> Self {
        self.max_addresses = max_addresses.max(1);
        self
    }

    /// Returns true if the address may attempt a capture, false if rate limited.
    ///
    /// Denied attempts are not recorded, so the window always holds the most
    /// recent admitted attempts only.
    pub async fn check(&self, address: &str) -> bool {
        let mut map = self.inner.lock().await;
        // Read the clock under the lock so each window stays sorted.
        let now = self.clock.now_monotonic();

        if !map.contains_key(address) && map.len() >= self.max_addresses {
            self.make_room(&mut map, now);
        }

        let attempts = map.entry(address.to_string()).or_default();
        prune(attempts, now, self.window);

        if attempts.len() >= self.max_attempts {
            tracing::warn!(address, attempts = attempts.len(), "capture rate limit exceeded");
            return false;
        }
        attempts.push_back(now);
        true
    }

    /// Drops every address whose window has emptied. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let mut map = self.inner.lock().await;
        let now = self.clock.now_monotonic();
        let removed = sweep_windows(&mut map, now, self.window);
        if removed > 0 {
            tracing::debug!(removed, remaining = map.len(), "swept idle addresses");
        }
        removed
    }

    /// Number of attempts currently inside the window for `address`.
    pub async fn attempts(&self, address: &str) -> usize {
        let map = self.inner.lock().await;
        let now = self.clock.now_monotonic();
        map.get(address)
            .map(|w| w.iter().filter(|&&t| now.saturating_duration_since(t) < self.window).count())
            .unwrap_or(0)
    }

    pub async fn tracked_addresses(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Frees a slot for a new address: drop idle windows, then evict the
    /// address whose newest attempt is oldest.
    ///
    /// Runs only when the map is full, and costs a full scan under the lock.
    /// An evicted address that was still inside its window starts over empty
    /// if it returns, so the cap trades exact limiting for bounded memory.
    fn make_room(&self, map: &mut Windows, now: Instant) {
        sweep_windows(map, now, self.window);
        while map.len() >= self.max_addresses {
            let stalest = map
                .iter()
                .min_by_key(|(_, w)| w.back().copied())
                .map(|(addr, _)| addr.clone());
            match stalest {
                Some(addr) => {
                    tracing::debug!(address = %addr, "evicting address to stay under tracker cap");
                    map.remove(&addr);
                }
                None => break,
            }
        }
    }
}

fn prune(attempts: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = attempts.front() {
        if now.saturating_duration_since(oldest) >= window {
            attempts.pop_front();
        } else {
            break;
        }
    }
}

fn sweep_windows(map: &mut Windows, now: Instant, window: Duration) -> usize {
    let before = map.len();
    map.retain(|_, attempts| {
        prune(attempts, now, window);
        !attempts.is_empty()
    });
    before - map.len()
}
