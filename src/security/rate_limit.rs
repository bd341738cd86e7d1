//! Sliding-window submission limiter.
//!
//! Each client identifier maps to the timestamps of its recent accepted
//! attempts. On every check the stored timestamps are filtered to the trailing
//! window; there is no background expiry. Rejected attempts are not recorded,
//! so a client that keeps hammering is admitted again once its oldest accepted
//! attempt leaves the window.
//!
//! Filtering, the allowance check and recording happen in one store call, so
//! concurrent requests for the same client can't both take the last slot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Source of "now" in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Manually advanced clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Outcome of [`WindowStore::record_if_under`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Recorded. `fresh` is set when the key had no attempts in the window.
    Admitted { fresh: bool },
    /// Not recorded; `attempts` are already inside the window.
    Rejected { attempts: usize },
}

/// Backing store for attempt timestamps.
///
/// The in-memory store suits a single instance. Deployments with several
/// instances plug in a shared counter store here.
pub trait WindowStore: Send + Sync {
    /// Timestamps recorded for `key`, oldest first.
    fn attempts(&self, key: &str) -> Vec<u64>;

    /// Atomically drop attempts older than the window and record `now_ms`
    /// if fewer than `max` remain.
    fn record_if_under(&self, key: &str, now_ms: u64, window_ms: u64, max: usize) -> Admission;

    /// Number of tracked keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop keys whose newest attempt is older than `cutoff_ms`.
    fn prune_before(&self, cutoff_ms: u64);

    /// Drop the key with the oldest newest-attempt, never `keep`. Returns
    /// false when nothing could be evicted.
    fn evict_least_recent(&self, keep: &str) -> bool;
}

/// Process-local store with a bounded key count.
#[derive(Debug, Default)]
pub struct InMemoryWindowStore {
    entries: Mutex<HashMap<String, Vec<u64>>>,
}

impl InMemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowStore for InMemoryWindowStore {
    fn attempts(&self, key: &str) -> Vec<u64> {
        let entries = self.entries.lock().expect("rate limiter mutex poisoned");
        entries.get(key).cloned().unwrap_or_default()
    }

    fn record_if_under(&self, key: &str, now_ms: u64, window_ms: u64, max: usize) -> Admission {
        let mut entries = self.entries.lock().expect("rate limiter mutex poisoned");
        let attempts = entries.entry(key.to_string()).or_default();
        attempts.retain(|&t| now_ms.saturating_sub(t) < window_ms);

        if attempts.len() >= max {
            let attempts = attempts.len();
            if attempts == 0 {
                entries.remove(key);
            }
            return Admission::Rejected { attempts };
        }

        let fresh = attempts.is_empty();
        attempts.push(now_ms);
        Admission::Admitted { fresh }
    }

    fn len(&self) -> usize {
        self.entries.lock().expect("rate limiter mutex poisoned").len()
    }

    fn prune_before(&self, cutoff_ms: u64) {
        let mut entries = self.entries.lock().expect("rate limiter mutex poisoned");
        entries.retain(|_, attempts| attempts.last().is_some_and(|&t| t >= cutoff_ms));
    }

    fn evict_least_recent(&self, keep: &str) -> bool {
        let mut entries = self.entries.lock().expect("rate limiter mutex poisoned");
        let oldest = entries
            .iter()
            .filter(|(key, _)| key.as_str() != keep)
            .min_by_key(|(_, attempts)| attempts.last().copied().unwrap_or(0))
            .map(|(key, _)| key.clone());
        match oldest {
            Some(key) => entries.remove(&key).is_some(),
            None => false,
        }
    }
}

/// Per-client sliding window limiter.
pub struct SlidingWindowLimiter {
    store: Box<dyn WindowStore>,
    clock: Box<dyn Clock>,
    window_ms: AtomicU64,
    max_per_window: AtomicU32,
    max_tracked_clients: usize,
}

impl SlidingWindowLimiter {
    /// Limiter with the in-memory store and the system clock.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_parts(config, InMemoryWindowStore::new(), SystemClock)
    }

    pub fn with_parts(
        config: &RateLimitConfig,
        store: impl WindowStore + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            store: Box::new(store),
            clock: Box::new(clock),
            window_ms: AtomicU64::new(config.window_ms),
            max_per_window: AtomicU32::new(config.max_per_window),
            max_tracked_clients: config.max_tracked_clients.max(1),
        }
    }

    /// Apply new window settings. Recorded attempts are kept.
    pub fn reconfigure(&self, config: &RateLimitConfig) {
        self.window_ms.store(config.window_ms, Ordering::Relaxed);
        self.max_per_window.store(config.max_per_window, Ordering::Relaxed);
    }

    /// Record an attempt for `client_id` if it is within its allowance.
    pub fn allow(&self, client_id: &str) -> bool {
        let now = self.clock.now_ms();
        let window = self.window_ms.load(Ordering::Relaxed);
        let max = self.max_per_window.load(Ordering::Relaxed) as usize;

        match self.store.record_if_under(client_id, now, window, max) {
            Admission::Rejected { attempts } => {
                tracing::warn!(client = %client_id, attempts, "Submission rate limit exceeded");
                metrics::record_rate_limited();
                false
            }
            Admission::Admitted { fresh } => {
                if fresh {
                    self.make_room(client_id, now.saturating_sub(window));
                }
                true
            }
        }
    }

    /// Bring the key count back under the bound after `newcomer` was tracked.
    fn make_room(&self, newcomer: &str, cutoff_ms: u64) {
        if self.store.len() <= self.max_tracked_clients {
            return;
        }
        self.store.prune_before(cutoff_ms);
        while self.store.len() > self.max_tracked_clients {
            if !self.store.evict_least_recent(newcomer) {
                break;
            }
        }
        tracing::debug!(tracked = self.store.len(), "Pruned rate limiter entries");
    }

    pub fn tracked_clients(&self) -> usize {
        self.store.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(clock: Arc<ManualClock>) -> SlidingWindowLimiter {
        SlidingWindowLimiter::with_parts(&RateLimitConfig::default(), InMemoryWindowStore::new(), clock)
    }

    #[test]
    fn fourth_attempt_in_window_is_rejected() {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let limiter = limiter(clock.clone());

        assert!(limiter.allow("1.2.3.4"));
        clock.advance(10_000);
        assert!(limiter.allow("1.2.3.4"));
        clock.advance(10_000);
        assert!(limiter.allow("1.2.3.4"));
        clock.advance(10_000);
        assert!(!limiter.allow("1.2.3.4"));

        // Other clients are unaffected.
        assert!(limiter.allow("5.6.7.8"));
    }

    #[test]
    fn admits_again_once_oldest_attempt_leaves_window() {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let limiter = limiter(clock.clone());

        for _ in 0..3 {
            assert!(limiter.allow("unknown"));
            clock.advance(1_000);
        }
        assert!(!limiter.allow("unknown"));

        // Oldest accepted attempt was at 1_000_000.
        clock.set(1_000_000 + 59_999);
        assert!(!limiter.allow("unknown"));
        clock.set(1_000_000 + 60_000);
        assert!(limiter.allow("unknown"));
        assert!(!limiter.allow("unknown"));
    }

    #[test]
    fn rejected_attempts_are_not_recorded() {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(InMemoryWindowStore::new());
        let limiter = SlidingWindowLimiter::with_parts(
            &RateLimitConfig::default(),
            SharedStore(store.clone()),
            clock.clone(),
        );

        for _ in 0..10 {
            limiter.allow("a");
        }
        assert_eq!(store.attempts("a").len(), 3);
    }

    #[test]
    fn reconfigure_changes_allowance() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = limiter(clock);
        limiter.reconfigure(&RateLimitConfig {
            max_per_window: 1,
            ..RateLimitConfig::default()
        });
        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));
    }

    #[test]
    fn tracked_clients_stay_bounded() {
        let clock = Arc::new(ManualClock::new(0));
        let config = RateLimitConfig {
            max_tracked_clients: 3,
            ..RateLimitConfig::default()
        };
        let limiter =
            SlidingWindowLimiter::with_parts(&config, InMemoryWindowStore::new(), clock.clone());

        for i in 0..3 {
            assert!(limiter.allow(&format!("client-{i}")));
            clock.advance(1);
        }
        assert_eq!(limiter.tracked_clients(), 3);

        // All three are still inside the window, so the least recent goes.
        assert!(limiter.allow("client-3"));
        assert_eq!(limiter.tracked_clients(), 3);

        // After the window passes, stale keys are pruned in one sweep.
        clock.advance(120_000);
        assert!(limiter.allow("client-4"));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn newcomer_survives_eviction_at_the_same_instant() {
        let clock = Arc::new(ManualClock::new(5_000));
        let config = RateLimitConfig {
            max_tracked_clients: 1,
            ..RateLimitConfig::default()
        };
        let store = Arc::new(InMemoryWindowStore::new());
        let limiter = SlidingWindowLimiter::with_parts(&config, SharedStore(store.clone()), clock);

        assert!(limiter.allow("a"));
        assert!(limiter.allow("b"));
        assert_eq!(limiter.tracked_clients(), 1);
        assert_eq!(store.attempts("b"), vec![5_000]);
    }

    #[test]
    fn concurrent_attempts_share_one_allowance() {
        let limiter = SlidingWindowLimiter::with_parts(
            &RateLimitConfig::default(),
            InMemoryWindowStore::new(),
            ManualClock::new(1_000),
        );
        let admitted = AtomicU32::new(0);

        std::thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    if limiter.allow("203.0.113.5") {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(admitted.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn zero_allowance_leaves_no_entry() {
        let store = InMemoryWindowStore::new();
        assert_eq!(
            store.record_if_under("a", 10, 60_000, 0),
            Admission::Rejected { attempts: 0 }
        );
        assert!(store.is_empty());
    }

    struct SharedStore(Arc<InMemoryWindowStore>);

    impl WindowStore for SharedStore {
        fn attempts(&self, key: &str) -> Vec<u64> {
            self.0.attempts(key)
        }
        fn record_if_under(&self, key: &str, now_ms: u64, window_ms: u64, max: usize) -> Admission {
            self.0.record_if_under(key, now_ms, window_ms, max)
        }
        fn len(&self) -> usize {
            self.0.len()
        }
        fn prune_before(&self, cutoff_ms: u64) {
            self.0.prune_before(cutoff_ms)
        }
        fn evict_least_recent(&self, keep: &str) -> bool {
            self.0.evict_least_recent(keep)
        }
    }
}
