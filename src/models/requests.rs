//! Request DTOs for the gateway API
//!
//! Defines query parameters and the identifier rules shared by every route.

use std::time::Duration;

use serde::Deserialize;

use crate::config::Config;

/// Maximum allowed exchange identifier length
pub const MAX_EXCHANGE_ID_LENGTH: usize = 32;

/// Maximum allowed symbol length
pub const MAX_SYMBOL_LENGTH: usize = 64;

/// Largest number of candles one request may ask for
pub const MAX_CANDLE_LIMIT: u32 = 1000;

/// Validates an exchange identifier such as `binance`.
///
/// ASCII letters, digits and `_` only. Case is not checked here; an id that
/// names no exchange is left for the catalog to reject. Returns an error
/// message if invalid, None if valid.
pub fn validate_exchange_id(exchange_id: &str) -> Option<String> {
    if exchange_id.is_empty() {
        return Some("Exchange id cannot be empty".to_string());
    }
    if exchange_id.len() > MAX_EXCHANGE_ID_LENGTH {
        return Some(format!(
            "Exchange id exceeds maximum length of {} characters",
            MAX_EXCHANGE_ID_LENGTH
        ));
    }
    if !exchange_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Some(format!("Invalid exchange id '{}'", exchange_id));
    }
    None
}

/// Validates a trading symbol such as `BTC/USDT`.
///
/// ASCII letters, digits and `/ : - _ .` only. In particular `|` is never
/// allowed, which keeps cache keys unambiguous.
pub fn validate_symbol(symbol: &str) -> Option<String> {
    if symbol.is_empty() {
        return Some("Symbol cannot be empty".to_string());
    }
    if symbol.len() > MAX_SYMBOL_LENGTH {
        return Some(format!(
            "Symbol exceeds maximum length of {} characters",
            MAX_SYMBOL_LENGTH
        ));
    }
    if !symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '-' | '_' | '.'))
    {
        return Some(format!("Invalid symbol '{}'", symbol));
    }
    None
}

fn default_timeframe() -> String {
    "1d".to_string()
}

fn default_limit() -> Option<u32> {
    Some(100)
}

/// Query for `GET /historical/:exchange_id/:symbol`
#[derive(Debug, Clone, Deserialize)]
pub struct HistoricalQuery {
    /// Candle timeframe, e.g. `1m`, `1h`, `1d`
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    /// Start time as Unix timestamp in milliseconds
    #[serde(default)]
    pub since: Option<i64>,
    /// Number of candles to retrieve, 1..=1000
    #[serde(default = "default_limit")]
    pub limit: Option<u32>,
}

impl HistoricalQuery {
    pub fn validate(&self) -> Option<String> {
        if self.timeframe.is_empty() {
            return Some("Timeframe cannot be empty".to_string());
        }
        if let Some(limit) = self.limit {
            if limit == 0 || limit > MAX_CANDLE_LIMIT {
                return Some(format!(
                    "Limit must be between 1 and {}",
                    MAX_CANDLE_LIMIT
                ));
            }
        }
        if matches!(self.since, Some(since) if since < 0) {
            return Some("Since cannot be negative".to_string());
        }
        None
    }
}

/// Query for the WebSocket ticker stream
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamQuery {
    /// Polling interval in seconds
    #[serde(default)]
    pub poll_interval: Option<u64>,
}

impl StreamQuery {
    /// Resolves the polling interval against the configured bounds.
    pub fn resolve(&self, config: &Config) -> Result<Duration, String> {
        let secs = self.poll_interval.unwrap_or(config.ws_poll_interval_default);
        if secs < config.ws_poll_interval_min || secs > config.ws_poll_interval_max {
            return Err(format!(
                "poll_interval must be between {} and {} seconds",
                config.ws_poll_interval_min, config.ws_poll_interval_max
            ));
        }
        Ok(Duration::from_secs(secs))
    }
}

/// Query for `POST /admin/reset-rate-limit`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetRateLimitQuery {
    /// Client to reset; all clients when absent
    #[serde(default)]
    pub client_id: Option<String>,
}
