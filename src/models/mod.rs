//! Request and Response models for the gateway API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies, and the market
//! records the gateway serves.

pub mod market;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use market::{Candle, Ticker};
pub use requests::{HistoricalQuery, ResetRateLimitQuery, StreamQuery};
pub use responses::{
    ErrorResponse, HealthResponse, MessageResponse, ResetRateLimitResponse, RootResponse,
};
