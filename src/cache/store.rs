//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with FIFO write tracking and
//! lazy TTL expiration.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::cache::{CacheCounters, CacheEntry, CacheStats, InsertionOrder};

// == TTL Cache ==
/// Key-value store with a single TTL for all entries and a bounded size.
///
/// Expiry is lazy: an entry older than the TTL is removed when it is read
/// (or by an explicit [`purge_expired`](Self::purge_expired) sweep), so expired
/// entries can still occupy capacity until then. When a new key arrives at
/// capacity, the entry with the oldest write is evicted. Reads do not affect
/// eviction order.
///
/// The store is not synchronized; callers share it behind a mutex.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// Write order tracker
    order: InsertionOrder<K>,
    /// Hit/miss/eviction counters
    counters: CacheCounters,
    /// Time-to-live applied to every entry
    ttl: Duration,
    /// Maximum number of entries allowed
    max_size: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a new cache with the given TTL and capacity.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            counters: CacheCounters::new(),
            ttl,
            max_size: max_size.max(1),
        }
    }

    // == Set ==
    /// Stores a value, overwriting any previous value for the key.
    pub fn set(&mut self, key: K, value: V) {
        self.set_at(key, value, Instant::now());
    }

    /// Stores a value as written at `now`.
    ///
    /// Overwriting resets the key's insertion time and never evicts. A new key
    /// at capacity first evicts the oldest write.
    pub fn set_at(&mut self, key: K, value: V, now: Instant) {
        let previous = self.entries.get(&key).map(|entry| entry.seq);

        if previous.is_none() && self.entries.len() >= self.max_size {
            if let Some(evicted) = self.order.pop_oldest() {
                self.entries.remove(&evicted);
                self.counters.record_eviction();
            }
        }

        let seq = self.order.record_write(&key, previous);
        self.entries.insert(key, CacheEntry::new(value, now, seq));

        debug_assert_eq!(self.entries.len(), self.order.len());
    }

    // == Get ==
    /// Retrieves a live value by key.
    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Retrieves a value by key as seen at `now`.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        let Some(entry) = self.entries.get(key) else {
            self.counters.record_miss();
            return None;
        };

        if entry.is_expired_at(now, self.ttl) {
            let seq = entry.seq;
            self.entries.remove(key);
            self.order.remove(seq);
            self.counters.record_miss();
            return None;
        }

        self.counters.record_hit();
        Some(entry.value.clone())
    }

    // == Delete ==
    /// Removes an entry by key, returning whether it was present.
    ///
    /// Does not affect statistics.
    pub fn delete(&mut self, key: &K) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.order.remove(entry.seq);
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Removes every entry and resets all counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.counters.reset();
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats::snapshot(&self.counters, self.entries.len(), self.max_size, self.ttl)
    }

    // == Purge Expired ==
    /// Removes all entries already expired at `now`.
    ///
    /// Returns the number of entries removed. Live entries are never touched
    /// and statistics are unchanged.
    pub fn purge_expired_at(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let expired: Vec<(K, u64)> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now, ttl))
            .map(|(key, entry)| (key.clone(), entry.seq))
            .collect();

        for (key, seq) in &expired {
            self.entries.remove(key);
            self.order.remove(*seq);
        }

        expired.len()
    }

    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    // == Length ==
    /// Returns the current number of entries, expired-but-unread included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}
