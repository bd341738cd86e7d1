//! Short-lived memory of caller supplied idempotency keys.
//!
//! A retried submission carrying the same key from the same client within the
//! TTL gets the original submission id back instead of creating a second
//! record. Entries live in process memory only.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;

use crate::config::IdempotencyConfig;

#[derive(Debug, Clone)]
struct Entry {
    submission_id: String,
    accepted_at_ms: u64,
}

pub struct IdempotencyCache {
    entries: DashMap<String, Entry>,
    enabled: AtomicBool,
    ttl_ms: AtomicU64,
    max_entries: usize,
}

fn cache_key(client_id: &str, key: &str) -> String {
    format!("{client_id}\u{1f}{key}")
}

impl IdempotencyCache {
    pub fn new(config: &IdempotencyConfig) -> Self {
        Self {
            entries: DashMap::new(),
            enabled: AtomicBool::new(config.enabled),
            ttl_ms: AtomicU64::new(config.ttl_secs.saturating_mul(1000)),
            max_entries: config.max_entries.max(1),
        }
    }

    pub fn reconfigure(&self, config: &IdempotencyConfig) {
        self.enabled.store(config.enabled, Ordering::Relaxed);
        self.ttl_ms
            .store(config.ttl_secs.saturating_mul(1000), Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Submission id previously accepted for this key, if still fresh.
    pub fn lookup(&self, client_id: &str, key: &str, now_ms: u64) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        let ttl = self.ttl_ms.load(Ordering::Relaxed);
        let k = cache_key(client_id, key);

        let entry = self.entries.get(&k).map(|e| e.value().clone())?;
        if now_ms.saturating_sub(entry.accepted_at_ms) < ttl {
            Some(entry.submission_id)
        } else {
            self.entries.remove(&k);
            None
        }
    }

    pub fn remember(&self, client_id: &str, key: &str, submission_id: &str, now_ms: u64) {
        if !self.is_enabled() {
            return;
        }
        if self.entries.len() >= self.max_entries {
            let ttl = self.ttl_ms.load(Ordering::Relaxed);
            self.entries
                .retain(|_, e| now_ms.saturating_sub(e.accepted_at_ms) < ttl);
        }
        if self.entries.len() >= self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|e| e.value().accepted_at_ms)
                .map(|e| e.key().clone());
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
            }
        }

        self.entries.insert(
            cache_key(client_id, key),
            Entry {
                submission_id: submission_id.to_string(),
                accepted_at_ms: now_ms,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
