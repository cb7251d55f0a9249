//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Result};

/// Prefix shared by every configuration variable.
pub const ENV_PREFIX: &str = "GATEWAY_";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Gateway configuration parameters.
///
/// All values can be configured via `GATEWAY_*` environment variables with
/// sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub app_version: String,
    /// HTTP server port
    pub server_port: u16,
    /// Ticker cache TTL in seconds
    pub ticker_cache_ttl: u64,
    /// Maximum number of cached tickers
    pub cache_max_size: usize,
    /// Requests allowed per client per period
    pub rate_limit_requests: u32,
    /// Rate-limit period in seconds
    pub rate_limit_period: u64,
    /// WebSocket polling interval bounds in seconds
    pub ws_poll_interval_min: u64,
    pub ws_poll_interval_default: u64,
    pub ws_poll_interval_max: u64,
    /// Upstream call timeout in milliseconds
    pub upstream_timeout_ms: u64,
    /// Background sweep interval in seconds
    pub sweep_interval: u64,
    /// Idle buckets are dropped after this many rate-limit periods
    pub bucket_idle_periods: u32,
    pub log_format: LogFormat,
}

/// Reads `GATEWAY_<name>`, falling back to `default` when unset or unparseable.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(format!("{}{}", ENV_PREFIX, name))
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `GATEWAY_APP_NAME` (default: "Market Gateway")
    /// - `GATEWAY_SERVER_PORT` (default: 8000)
    /// - `GATEWAY_TICKER_CACHE_TTL` - seconds (default: 10)
    /// - `GATEWAY_CACHE_MAX_SIZE` (default: 1000)
    /// - `GATEWAY_RATE_LIMIT_REQUESTS` (default: 100)
    /// - `GATEWAY_RATE_LIMIT_PERIOD` - seconds (default: 60)
    /// - `GATEWAY_WS_POLL_INTERVAL_MIN` / `_DEFAULT` / `_MAX` - seconds (default: 1 / 5 / 60)
    /// - `GATEWAY_UPSTREAM_TIMEOUT_MS` (default: 30000)
    /// - `GATEWAY_SWEEP_INTERVAL` - seconds (default: 30)
    /// - `GATEWAY_BUCKET_IDLE_PERIODS` (default: 10)
    /// - `GATEWAY_LOG_FORMAT` - `text` or `json` (default: text)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            app_name: env_or("APP_NAME", defaults.app_name),
            app_version: defaults.app_version,
            server_port: env_or("SERVER_PORT", defaults.server_port),
            ticker_cache_ttl: env_or("TICKER_CACHE_TTL", defaults.ticker_cache_ttl),
            cache_max_size: env_or("CACHE_MAX_SIZE", defaults.cache_max_size),
            rate_limit_requests: env_or("RATE_LIMIT_REQUESTS", defaults.rate_limit_requests),
            rate_limit_period: env_or("RATE_LIMIT_PERIOD", defaults.rate_limit_period),
            ws_poll_interval_min: env_or("WS_POLL_INTERVAL_MIN", defaults.ws_poll_interval_min),
            ws_poll_interval_default: env_or(
                "WS_POLL_INTERVAL_DEFAULT",
                defaults.ws_poll_interval_default,
            ),
            ws_poll_interval_max: env_or("WS_POLL_INTERVAL_MAX", defaults.ws_poll_interval_max),
            upstream_timeout_ms: env_or("UPSTREAM_TIMEOUT_MS", defaults.upstream_timeout_ms),
            sweep_interval: env_or("SWEEP_INTERVAL", defaults.sweep_interval),
            bucket_idle_periods: env_or("BUCKET_IDLE_PERIODS", defaults.bucket_idle_periods),
            log_format: env_or("LOG_FORMAT", defaults.log_format),
        }
    }

    /// Rejects settings the cache, limiter or stream cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache_max_size == 0 {
            bail!("cache_max_size must be at least 1");
        }
        if self.ticker_cache_ttl == 0 {
            bail!("ticker_cache_ttl must be at least 1 second");
        }
        if self.rate_limit_requests == 0 {
            bail!("rate_limit_requests must be at least 1");
        }
        if self.rate_limit_period == 0 {
            bail!("rate_limit_period must be at least 1 second");
        }
        if self.ws_poll_interval_min == 0 {
            bail!("ws_poll_interval_min must be at least 1 second");
        }
        if !(self.ws_poll_interval_min <= self.ws_poll_interval_default
            && self.ws_poll_interval_default <= self.ws_poll_interval_max)
        {
            bail!(
                "poll interval bounds must satisfy min <= default <= max (got {} / {} / {})",
                self.ws_poll_interval_min,
                self.ws_poll_interval_default,
                self.ws_poll_interval_max
            );
        }
        if self.upstream_timeout_ms == 0 {
            bail!("upstream_timeout_ms must be positive");
        }
        if self.sweep_interval == 0 {
            bail!("sweep_interval must be at least 1 second");
        }
        if self.bucket_idle_periods == 0 {
            bail!("bucket_idle_periods must be at least 1");
        }
        if self
            .rate_limit_period()
            .checked_mul(self.bucket_idle_periods)
            .is_none()
        {
            bail!(
                "rate_limit_period * bucket_idle_periods overflows ({}s x {})",
                self.rate_limit_period,
                self.bucket_idle_periods
            );
        }
        Ok(())
    }

    pub fn ticker_ttl(&self) -> Duration {
        Duration::from_secs(self.ticker_cache_ttl)
    }

    pub fn rate_limit_period(&self) -> Duration {
        Duration::from_secs(self.rate_limit_period)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }

    /// How long a client bucket may sit untouched before the sweep drops it.
    ///
    /// Saturates instead of overflowing; `validate` rejects such settings.
    pub fn bucket_max_idle(&self) -> Duration {
        self.rate_limit_period()
            .checked_mul(self.bucket_idle_periods)
            .unwrap_or(Duration::MAX)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Market Gateway".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            server_port: 8000,
            ticker_cache_ttl: 10,
            cache_max_size: 1000,
            rate_limit_requests: 100,
            rate_limit_period: 60,
            ws_poll_interval_min: 1,
            ws_poll_interval_default: 5,
            ws_poll_interval_max: 60,
            upstream_timeout_ms: 30_000,
            sweep_interval: 30,
            bucket_idle_periods: 10,
            log_format: LogFormat::Text,
        }
    }
}
