//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use std::time::Duration;

use serde::Serialize;

// == Cache Counters ==
/// Running counters owned by the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheCounters {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted to make room for new keys
    pub evictions: u64,
}

impl CacheCounters {
    // == Constructor ==
    /// Creates new counters, all at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the hit rate as a percentage rounded to two decimals.
    ///
    /// Returns 0.0 if no requests have been observed.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            let percent = self.hits as f64 / total as f64 * 100.0;
            (percent * 100.0).round() / 100.0
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Reset ==
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// == Cache Stats ==
/// Point-in-time snapshot of the cache, as served by diagnostics endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Current number of entries, including expired ones not yet read
    pub size: usize,
    /// Capacity before eviction kicks in
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Hit rate formatted as a percentage, e.g. "75.00%"
    pub hit_rate: String,
    /// Entry time-to-live in seconds
    #[serde(rename = "ttl")]
    pub ttl_seconds: f64,
}

impl CacheStats {
    /// Builds a snapshot from the live counters.
    pub fn snapshot(counters: &CacheCounters, size: usize, max_size: usize, ttl: Duration) -> Self {
        Self {
            size,
            max_size,
            hits: counters.hits,
            misses: counters.misses,
            evictions: counters.evictions,
            hit_rate: format!("{:.2}%", counters.hit_rate()),
            ttl_seconds: ttl.as_secs_f64(),
        }
    }
}
