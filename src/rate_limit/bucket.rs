//! Token Bucket Module
//!
//! A single client's bucket with continuous linear refill.

use std::time::{Duration, Instant};

// == Bucket ==
/// Token state for one client.
///
/// Tokens are always recomputed from elapsed time before they are consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    /// Tokens available as of `last_update`, in `[0, capacity]`
    pub tokens: f64,
    /// Last time a token was consumed (or the bucket created)
    pub last_update: Instant,
}

impl Bucket {
    /// Creates a bucket holding `capacity` tokens.
    pub fn full(capacity: u32, now: Instant) -> Self {
        Self {
            tokens: f64::from(capacity),
            last_update: now,
        }
    }

    // == Refill ==
    /// Tokens the bucket would hold at `now`, without mutating it.
    ///
    /// Refill is linear: a whole `period` restores `capacity` tokens.
    pub fn available_at(&self, now: Instant, capacity: u32, period: Duration) -> f64 {
        let capacity = f64::from(capacity);
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        let refill = elapsed * capacity / period.as_secs_f64();
        (self.tokens + refill).min(capacity)
    }

    // == Try Take ==
    /// Consumes one token at `now` if at least one is available.
    ///
    /// Returns the tokens left after consumption. On rejection the bucket is
    /// left untouched.
    pub fn try_take(&mut self, now: Instant, capacity: u32, period: Duration) -> Option<f64> {
        let available = self.available_at(now, capacity, period);
        if available < 1.0 {
            return None;
        }
        self.tokens = available - 1.0;
        self.last_update = now;
        Some(self.tokens)
    }

    /// Whether the bucket has gone untouched for longer than `max_idle`.
    pub fn is_idle_at(&self, now: Instant, max_idle: Duration) -> bool {
        now.saturating_duration_since(self.last_update) > max_idle
    }
}
