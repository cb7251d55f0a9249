//! Market Gateway - a crypto market data gateway
//!
//! Serves tickers and OHLCV candles from many exchanges behind one HTTP API,
//! with a TTL ticker cache, per-client token bucket rate limiting and
//! WebSocket ticker streams.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod service;
pub mod tasks;
pub mod upstream;

pub use api::{create_router, AppState};
pub use cache::{CacheStats, TtlCache};
pub use config::{Config, LogFormat};
pub use error::{GatewayError, Result};
pub use rate_limit::{RateDecision, RateLimiter};
pub use service::{MarketDataService, TickerKey};
pub use tasks::spawn_sweep_task;
pub use upstream::{ExchangeConnector, ExchangeSession, SimulatedConnector};
