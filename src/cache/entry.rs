//! Cache Entry Module
//!
//! Defines the structure for individual cache entries and their expiry check.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with its value and write metadata.
///
/// Entries are never mutated once stored. Overwriting a key replaces the
/// whole entry, which also resets its insertion time.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When this entry was written
    pub inserted_at: Instant,
    /// Write sequence number, used for FIFO eviction ordering
    pub seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry written at `now`.
    pub fn new(value: V, inserted_at: Instant, seq: u64) -> Self {
        Self {
            value,
            inserted_at,
            seq,
        }
    }

    // == Age ==
    /// Returns how long ago the entry was written, saturating at zero.
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inserted_at)
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `ttl` at `now`.
    ///
    /// Boundary condition: an entry whose age is exactly `ttl` is still
    /// valid. Only an age strictly greater than `ttl` counts as expired.
    pub fn is_expired_at(&self, now: Instant, ttl: Duration) -> bool {
        self.age_at(now) > ttl
    }
}
