//! Records exchanged with upstream adapters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by an upstream exchange adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Unknown exchange, symbol or market
    #[error("{0}")]
    NotFound(String),

    /// The exchange does not offer the requested feature
    #[error("{0}")]
    Unsupported(String),

    /// Connectivity problem or timeout; safe to retry
    #[error("{0}")]
    Network(String),

    /// The exchange refused the request as malformed
    #[error("{0}")]
    ExchangeRejected(String),

    #[error("{0}")]
    Unknown(String),
}

/// Ticker as returned by an adapter, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTicker {
    pub symbol: String,
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last: Option<f64>,
    pub volume: Option<f64>,
}

/// `[timestamp_ms, open, high, low, close, volume]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawCandle(pub i64, pub f64, pub f64, pub f64, pub f64, pub f64);

/// What an exchange offers through the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeInfo {
    /// Identifier used in request paths, e.g. `binance`
    pub id: String,
    /// Display name
    pub name: String,
    /// Whether historical candles can be fetched
    pub has_ohlcv: bool,
    /// Candle timeframes offered, e.g. `["1m", "1h", "1d"]`
    pub timeframes: Vec<String>,
}

impl ExchangeInfo {
    pub fn supports_timeframe(&self, timeframe: &str) -> bool {
        self.timeframes.iter().any(|tf| tf == timeframe)
    }
}
