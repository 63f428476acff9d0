//! Bounded, TTL'd response store.
//!
//! [`CacheStore`] holds raw [`ProviderReply`] values keyed on a fuzzy
//! [`CacheKey`]. Expiry is checked on read: an entry whose age is at least
//! the TTL counts as a miss and is removed by that same lookup.
//!
//! # Pruning
//!
//! When an insert pushes the store past `max_entries`, the oldest
//! `ceil(max_entries * prune_fraction)` entries (by insertion time) are
//! removed in one batch. The whole prune runs under the same lock as the
//! insert, so concurrent readers see either the pre-prune or the post-prune
//! state and never a half-evicted store.
//!
//! Timestamps come from [`tokio::time::Instant`], so tests can drive expiry
//! with a paused clock.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::key::CacheKey;
use crate::telemetry;
use crate::types::ProviderReply;

/// Configuration for the response cache.
///
/// ```rust
/// # use tutorgate::cache::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(500)
///     .ttl(Duration::from_secs(600));
/// assert_eq!(config.prune_count(), 50);
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before a prune. Default: 150.
    pub max_entries: usize,
    /// Time-to-live for entries. Default: 20 minutes.
    pub ttl: Duration,
    /// Share of `max_entries` removed by one prune. Default: 0.1.
    pub prune_fraction: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 150,
            ttl: Duration::from_secs(1200),
            prune_fraction: 0.1,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn prune_fraction(mut self, fraction: f64) -> Self {
        self.prune_fraction = fraction;
        self
    }

    /// Number of entries removed by one prune: `ceil(max_entries * prune_fraction)`,
    /// at least one.
    pub fn prune_count(&self) -> usize {
        let count = (self.max_entries as f64 * self.prune_fraction).ceil();
        (count as usize).max(1)
    }
}

/// A cached reply and the moment it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub response: ProviderReply,
    pub inserted_at: Instant,
    // Tie-breaker for entries stored at the same instant.
    seq: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    next_seq: u64,
}

/// Thread-safe response cache owned by a [`Gateway`](crate::Gateway).
pub struct CacheStore {
    state: Mutex<CacheState>,
    config: CacheConfig,
}

impl CacheStore {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // Every mutation leaves the map consistent, so a poisoned lock is
        // still safe to use.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up an entry. Expired entries are removed and reported as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let mut state = self.lock();
        let fresh = match state.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.config.ttl => Some(entry.clone()),
            Some(_) => {
                state.entries.remove(key);
                debug!(key = key.short(), "cache entry expired");
                None
            }
            None => None,
        };
        drop(state);

        match fresh {
            Some(entry) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                Some(entry)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Insert or overwrite an entry, pruning if the store is now over its
    /// limit. Returns the number of entries evicted by the prune.
    pub fn put(&self, key: CacheKey, response: ProviderReply) -> usize {
        let mut state = self.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key,
            CacheEntry {
                response,
                inserted_at: Instant::now(),
                seq,
            },
        );

        if state.entries.len() <= self.config.max_entries {
            return 0;
        }

        let mut by_age: Vec<(Instant, u64, CacheKey)> = state
            .entries
            .iter()
            .map(|(k, e)| (e.inserted_at, e.seq, k.clone()))
            .collect();
        by_age.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let evicted = self.config.prune_count().min(by_age.len());
        for (_, _, k) in by_age.into_iter().take(evicted) {
            state.entries.remove(&k);
        }
        let remaining = state.entries.len();
        drop(state);

        metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL).increment(evicted as u64);
        debug!(evicted, remaining, "pruned response cache");
        evicted
    }

    /// Whether a live (unexpired) entry exists, without touching metrics or
    /// removing expired entries.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock()
            .entries
            .get(key)
            .is_some_and(|e| e.inserted_at.elapsed() < self.config.ttl)
    }

    /// Number of stored entries, expired-but-unread ones included.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(content: &str) -> ProviderReply {
        ProviderReply {
            content: content.into(),
            model: "m".into(),
            ..Default::default()
        }
    }

    #[test]
    fn prune_count_rounds_up() {
        assert_eq!(CacheConfig::default().prune_count(), 15);
        assert_eq!(CacheConfig::new().max_entries(5).prune_count(), 1);
        assert_eq!(CacheConfig::new().max_entries(11).prune_count(), 2);
        assert_eq!(CacheConfig::new().max_entries(0).prune_count(), 1);
    }

    #[test]
    fn overwrite_keeps_single_entry() {
        let store = CacheStore::default();
        store.put("k".into(), reply("first"));
        store.put("k".into(), reply("second"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&"k".into()).unwrap().response.content, "second");
    }

    #[test]
    fn same_instant_entries_evict_in_insertion_order() {
        let store = CacheStore::new(CacheConfig::new().max_entries(3));
        for i in 0..4 {
            store.put(format!("k{i}").as_str().into(), reply("x"));
        }
        assert_eq!(store.len(), 3);
        assert!(!store.contains(&"k0".into()));
        assert!(store.contains(&"k3".into()));
    }
}
