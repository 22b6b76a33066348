//! Hand-rolled LRU + TTL cache for [`TranscriptionResult`]s, keyed by the
//! compound fingerprint from `fingerprint::cache_key`.
//!
//! No `lru` crate dependency — none of the example repos pull one in; this
//! follows `audio::buffer::RingBuffer`'s manual-collection idiom instead
//! (a `HashMap` plus a recency `VecDeque`).

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::model::TranscriptionResult;

struct Entry {
    result: TranscriptionResult,
    inserted_at: Instant,
}

/// LRU-evicting, TTL-expiring cache. Eviction on overflow is strict LRU;
/// a low-frequency [`TranscriptionCache::sweep_expired`] call removes
/// entries past their TTL independent of capacity pressure (§4.4).
pub struct TranscriptionCache {
    capacity: usize,
    ttl: Duration,
    entries: HashMap<u64, Entry>,
    recency: VecDeque<u64>,
}

impl TranscriptionCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            entries: HashMap::new(),
            recency: VecDeque::new(),
        }
    }

    /// Returns the cached result for `key` if present and not expired,
    /// bumping its recency. Expired entries are evicted on lookup.
    pub fn get(&mut self, key: u64) -> Option<TranscriptionResult> {
        let expired = self
            .entries
            .get(&key)
            .is_some_and(|e| e.inserted_at.elapsed() > self.ttl);
        if expired {
            self.remove(key);
            return None;
        }
        if self.entries.contains_key(&key) {
            self.touch(key);
        }
        self.entries.get(&key).map(|e| e.result.clone())
    }

    /// Inserts or refreshes `key`, evicting the least-recently-used entry
    /// if the cache is at capacity.
    pub fn insert(&mut self, key: u64, result: TranscriptionResult) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self.recency.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(
            key,
            Entry {
                result,
                inserted_at: Instant::now(),
            },
        );
        self.touch(key);
    }

    /// Removes every entry older than the configured TTL. Intended to be
    /// driven by a low-frequency background sweep, not every call.
    pub fn sweep_expired(&mut self) -> usize {
        let ttl = self.ttl;
        let expired: Vec<u64> = self
            .entries
            .iter()
            .filter(|(_, e)| e.inserted_at.elapsed() > ttl)
            .map(|(k, _)| *k)
            .collect();
        let count = expired.len();
        for key in expired {
            self.remove(key);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, key: u64) {
        self.recency.retain(|&k| k != key);
        self.recency.push_back(key);
    }

    fn remove(&mut self, key: u64) {
        self.entries.remove(&key);
        self.recency.retain(|&k| k != key);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant as StdInstant;

    fn result(text: &str) -> TranscriptionResult {
        TranscriptionResult {
            text: text.into(),
            raw_provider_payload: "{}".into(),
            issued_at: StdInstant::now(),
            id: 1,
        }
    }

    #[test]
    fn insert_then_get_round_trips() {
        let mut cache = TranscriptionCache::new(10, Duration::from_secs(3600));
        cache.insert(1, result("hello"));
        assert_eq!(cache.get(1).unwrap().text, "hello");
    }

    #[test]
    fn missing_key_is_none() {
        let mut cache = TranscriptionCache::new(10, Duration::from_secs(3600));
        assert!(cache.get(999).is_none());
    }

    #[test]
    fn overflow_evicts_least_recently_used() {
        let mut cache = TranscriptionCache::new(2, Duration::from_secs(3600));
        cache.insert(1, result("a"));
        cache.insert(2, result("b"));
        cache.insert(3, result("c")); // evicts 1
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_some());
        assert!(cache.get(3).is_some());
    }

    #[test]
    fn get_refreshes_recency_so_it_survives_eviction() {
        let mut cache = TranscriptionCache::new(2, Duration::from_secs(3600));
        cache.insert(1, result("a"));
        cache.insert(2, result("b"));
        cache.get(1); // 1 is now most-recently-used
        cache.insert(3, result("c")); // evicts 2, not 1
        assert!(cache.get(1).is_some());
        assert!(cache.get(2).is_none());
    }

    #[test]
    fn expired_entries_are_treated_as_missing() {
        let mut cache = TranscriptionCache::new(10, Duration::from_millis(0));
        cache.insert(1, result("a"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let mut cache = TranscriptionCache::new(10, Duration::from_millis(0));
        cache.insert(1, result("a"));
        std::thread::sleep(Duration::from_millis(5));
        let removed = cache.sweep_expired();
        assert_eq!(removed, 1);
        assert!(cache.is_empty());
    }
}
