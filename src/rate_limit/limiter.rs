//! Per-client token bucket rate limiter.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use super::Bucket;

/// Identity shared by every client whose address cannot be resolved.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateDecision {
    /// One token was consumed; `remaining` whole tokens are left.
    Allowed { remaining: u32 },
    /// No token available. The caller should wait `retry_after` before retrying.
    Rejected { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Token bucket rate limiter keyed by client identity.
///
/// Every client gets a bucket of `capacity` tokens that refills continuously,
/// restoring the full quota over `period`. Buckets are created full on a
/// client's first request.
///
/// Refill-then-consume runs under the map's shard lock for that client, so
/// two concurrent requests can never both take the same last token.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<String, Bucket>,
    capacity: u32,
    period: Duration,
}

impl RateLimiter {
    pub fn new(capacity: u32, period: Duration) -> Self {
        Self {
            buckets: DashMap::new(),
            capacity,
            period,
        }
    }

    /// Checks and, if allowed, charges one request for `client_id`.
    pub fn check(&self, client_id: &str) -> RateDecision {
        self.check_at(client_id, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, client_id: &str, now: Instant) -> RateDecision {
        if let Some(mut bucket) = self.buckets.get_mut(client_id) {
            return self.take(&mut bucket, now);
        }

        let mut bucket = self
            .buckets
            .entry(client_id.to_owned())
            .or_insert_with(|| Bucket::full(self.capacity, now));
        self.take(&mut bucket, now)
    }

    fn take(&self, bucket: &mut Bucket, now: Instant) -> RateDecision {
        match bucket.try_take(now, self.capacity, self.period) {
            Some(left) => RateDecision::Allowed {
                remaining: left.floor() as u32,
            },
            None => RateDecision::Rejected {
                retry_after: self.period,
            },
        }
    }

    /// Forgets one client's bucket, or every bucket when `client_id` is `None`.
    ///
    /// A forgotten client starts again with a full bucket. Returns the number
    /// of buckets removed.
    pub fn reset(&self, client_id: Option<&str>) -> usize {
        match client_id {
            Some(id) => usize::from(self.buckets.remove(id).is_some()),
            None => {
                let removed = self.buckets.len();
                self.buckets.clear();
                removed
            }
        }
    }

    /// Drops buckets untouched for longer than `max_idle`.
    ///
    /// With `max_idle >= period` an evicted bucket would have refilled to full
    /// anyway, so clients cannot observe the eviction.
    pub fn evict_idle_at(&self, max_idle: Duration, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| !bucket.is_idle_at(now, max_idle));
        let removed = before.saturating_sub(self.buckets.len());
        if removed > 0 {
            debug!(removed, "evicted idle rate-limit buckets");
        }
        removed
    }

    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        self.evict_idle_at(max_idle, Instant::now())
    }

    /// Number of clients currently holding a bucket.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}
