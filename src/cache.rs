//! In-memory response cache.
//!
//! Caches whole response payloads keyed by request shape. Entries expire
//! after a TTL; when the cache is full, expired entries are evicted
//! first, then the oldest insertion.

use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

struct CacheEntry {
    payload: Value,
    cached_at: SystemTime,
    /// Monotonic insertion number; the eviction order.
    seq: u64,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at
            .elapsed()
            .map(|age| age >= ttl)
            .unwrap_or(true)
    }
}

pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
    next_seq: u64,
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_entries,
            next_seq: 0,
        }
    }

    /// Look up a fresh entry. Expired entries are removed on the way.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let expired = self
            .entries
            .get(key)
            .map(|e| e.is_expired(self.ttl))
            .unwrap_or(false);
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| e.payload.clone())
    }

    /// Insert a payload, evicting if at capacity.
    pub fn put(&mut self, key: String, payload: Value) {
        if self.max_entries == 0 {
            return;
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.evict_one();
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            key,
            CacheEntry {
                payload,
                cached_at: SystemTime::now(),
                seq,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_one(&mut self) {
        let victim = self
            .entries
            .iter()
            .find(|(_, e)| e.is_expired(self.ttl))
            .or_else(|| self.entries.iter().min_by_key(|(_, e)| e.seq))
            .map(|(k, _)| k.clone());
        if let Some(key) = victim {
            self.entries.remove(&key);
        }
    }
}
