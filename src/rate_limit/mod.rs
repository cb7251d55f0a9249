//! Rate Limiting Module
//!
//! Per-client token buckets with continuous refill.

mod bucket;
mod limiter;


pub use bucket::Bucket;
pub use limiter::{RateDecision, RateLimiter, UNKNOWN_CLIENT};
