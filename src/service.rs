//! Market data service.
//!
//! Wraps the upstream connector with the ticker cache. Tickers are cached per
//! exchange and symbol; historical candles are always fetched fresh.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, TtlCache};
use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::models::requests::{validate_exchange_id, validate_symbol};
use crate::models::{Candle, Ticker};
use crate::upstream::{ExchangeConnector, ExchangeInfo, UpstreamError, UpstreamResult};

/// Cache key for one exchange's ticker of one symbol.
///
/// Both parts are validated identifiers, neither of which may contain `|`,
/// so the display form `exchange|symbol` is unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TickerKey {
    exchange: String,
    symbol: String,
}

impl TickerKey {
    pub fn new(exchange_id: &str, symbol: &str) -> Result<Self> {
        ensure_valid(exchange_id, symbol)?;
        Ok(Self {
            exchange: exchange_id.to_string(),
            symbol: symbol.to_string(),
        })
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl fmt::Display for TickerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.exchange, self.symbol)
    }
}

fn ensure_valid(exchange_id: &str, symbol: &str) -> Result<()> {
    if let Some(msg) = validate_exchange_id(exchange_id).or_else(|| validate_symbol(symbol)) {
        return Err(GatewayError::InvalidRequest(msg));
    }
    Ok(())
}

/// Orchestrates cache lookups around upstream fetches.
pub struct MarketDataService {
    connector: Arc<dyn ExchangeConnector>,
    ticker_cache: Mutex<TtlCache<TickerKey, Ticker>>,
    upstream_timeout: Duration,
}

impl MarketDataService {
    pub fn new(
        connector: Arc<dyn ExchangeConnector>,
        ticker_ttl: Duration,
        cache_max_size: usize,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            connector,
            ticker_cache: Mutex::new(TtlCache::new(ticker_ttl, cache_max_size)),
            upstream_timeout,
        }
    }

    pub fn from_config(config: &Config, connector: Arc<dyn ExchangeConnector>) -> Self {
        Self::new(
            connector,
            config.ticker_ttl(),
            config.cache_max_size,
            config.upstream_timeout(),
        )
    }

    // == Tickers ==
    /// Returns the latest ticker, served from cache while it is fresh.
    ///
    /// Upstream failures are returned to the caller and never cached.
    pub async fn get_ticker(&self, exchange_id: &str, symbol: &str) -> Result<Ticker> {
        let key = TickerKey::new(exchange_id, symbol)?;

        let cached = self.ticker_cache.lock().get(&key);
        if let Some(ticker) = cached {
            debug!(%key, "ticker cache hit");
            return Ok(ticker);
        }

        debug!(%key, "ticker cache miss, fetching upstream");
        let ticker = self.fetch_ticker(&key).await?;
        self.ticker_cache.lock().set(key, ticker.clone());
        Ok(ticker)
    }

    async fn fetch_ticker(&self, key: &TickerKey) -> Result<Ticker> {
        self.ensure_exchange(key.exchange())?;

        let raw = self
            .call_upstream(key.exchange(), async {
                let mut session = self.connector.connect(key.exchange()).await?;
                session.fetch_ticker(key.symbol()).await
            })
            .await?;

        Ticker::from_raw(raw).map_err(|reason| {
            warn!(%key, reason = %reason, "discarding malformed ticker");
            GatewayError::Unknown(format!(
                "Malformed ticker from {}: {}",
                key.exchange(),
                reason
            ))
        })
    }

    // == Historical ==
    /// Fetches OHLCV candles. Never cached.
    pub async fn get_historical(
        &self,
        exchange_id: &str,
        symbol: &str,
        timeframe: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Candle>> {
        ensure_valid(exchange_id, symbol)?;
        self.ensure_exchange(exchange_id)?;

        let raw = self
            .call_upstream(exchange_id, async {
                let mut session = self.connector.connect(exchange_id).await?;
                check_candle_support(session.info(), timeframe)?;
                session.fetch_candles(symbol, timeframe, since, limit).await
            })
            .await?;

        raw.into_iter()
            .map(Candle::from_raw)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|reason| {
                GatewayError::Unknown(format!("Malformed candles from {}: {}", exchange_id, reason))
            })
    }

    // == Catalog ==
    pub fn list_exchanges(&self) -> Vec<ExchangeInfo> {
        self.connector.exchanges()
    }

    fn ensure_exchange(&self, exchange_id: &str) -> Result<()> {
        if self.connector.has_exchange(exchange_id) {
            Ok(())
        } else {
            Err(GatewayError::NotFound(format!(
                "Exchange '{}' not found.",
                exchange_id
            )))
        }
    }

    /// Runs one upstream call under the configured timeout.
    ///
    /// The call owns its session; on timeout the call future is dropped,
    /// which releases the session.
    async fn call_upstream<T, F>(&self, exchange_id: &str, call: F) -> Result<T>
    where
        F: Future<Output = UpstreamResult<T>>,
    {
        match tokio::time::timeout(self.upstream_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                warn!(exchange = exchange_id, error = %err, "upstream call failed");
                Err(err.into())
            }
            Err(_) => {
                warn!(
                    exchange = exchange_id,
                    timeout_ms = self.upstream_timeout.as_millis() as u64,
                    "upstream call timed out"
                );
                Err(GatewayError::Transient(format!(
                    "Request to {} timed out after {}ms",
                    exchange_id,
                    self.upstream_timeout.as_millis()
                )))
            }
        }
    }

    // == Cache Administration ==
    pub fn clear_caches(&self) {
        self.ticker_cache.lock().clear();
        info!("ticker cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.ticker_cache.lock().stats()
    }

    /// Drops expired tickers nobody has read since they expired.
    pub fn purge_expired(&self) -> usize {
        self.ticker_cache.lock().purge_expired()
    }
}

fn check_candle_support(info: &ExchangeInfo, timeframe: &str) -> UpstreamResult<()> {
    if !info.has_ohlcv {
        return Err(UpstreamError::Unsupported(format!(
            "Exchange '{}' does not support fetching OHLCV data.",
            info.id
        )));
    }
    if !info.supports_timeframe(timeframe) {
        return Err(UpstreamError::Unsupported(format!(
            "Timeframe '{}' not supported by {}. Supported: {:?}",
            timeframe, info.id, info.timeframes
        )));
    }
    Ok(())
}
