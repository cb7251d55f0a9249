//! In-process exchange adapter producing synthetic market data.
//!
//! Prices follow a slow deterministic wave around a base price per symbol, so
//! repeated calls look like a live market without any network access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::debug;

use super::{
    ExchangeConnector, ExchangeInfo, ExchangeSession, RawCandle, RawTicker, UpstreamError,
    UpstreamResult,
};

const DEFAULT_CANDLE_LIMIT: u32 = 100;
const MAX_CANDLE_LIMIT: u32 = 1000;

/// One simulated exchange and the markets it lists.
#[derive(Debug, Clone)]
pub struct SimulatedExchange {
    pub info: ExchangeInfo,
    /// Symbol -> base price
    pub markets: HashMap<String, f64>,
}

impl SimulatedExchange {
    pub fn new(id: &str, name: &str, timeframes: &[&str], markets: &[(&str, f64)]) -> Self {
        Self {
            info: ExchangeInfo {
                id: id.to_string(),
                name: name.to_string(),
                has_ohlcv: !timeframes.is_empty(),
                timeframes: timeframes.iter().map(|tf| tf.to_string()).collect(),
            },
            markets: markets
                .iter()
                .map(|(symbol, price)| (symbol.to_string(), *price))
                .collect(),
        }
    }

    fn base_price(&self, symbol: &str) -> UpstreamResult<f64> {
        self.markets.get(symbol).copied().ok_or_else(|| {
            UpstreamError::NotFound(format!(
                "Symbol '{}' not found on {}",
                symbol, self.info.id
            ))
        })
    }
}

/// Connector over a static set of [`SimulatedExchange`]s.
///
/// Keeps counters of upstream fetches and currently open sessions, and can be
/// told to add latency or to fail every call to a given exchange.
#[derive(Debug, Clone)]
pub struct SimulatedConnector {
    exchanges: Arc<Vec<SimulatedExchange>>,
    latency: Duration,
    failures: Arc<Mutex<HashMap<String, UpstreamError>>>,
    fetches: Arc<AtomicUsize>,
    open_sessions: Arc<AtomicUsize>,
}

impl SimulatedConnector {
    pub fn new(exchanges: Vec<SimulatedExchange>) -> Self {
        Self {
            exchanges: Arc::new(exchanges),
            latency: Duration::ZERO,
            failures: Arc::new(Mutex::new(HashMap::new())),
            fetches: Arc::new(AtomicUsize::new(0)),
            open_sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delays every fetch by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes every fetch against `exchange_id` fail with `error`, or clears the
    /// failure when `error` is `None`.
    pub fn set_failure(&self, exchange_id: &str, error: Option<UpstreamError>) {
        let mut failures = self.failures.lock();
        match error {
            Some(error) => {
                failures.insert(exchange_id.to_string(), error);
            }
            None => {
                failures.remove(exchange_id);
            }
        }
    }

    /// Number of fetches started so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of sessions not yet released.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedConnector {
    fn default() -> Self {
        Self::new(vec![
            SimulatedExchange::new(
                "binance",
                "Binance",
                &["1m", "5m", "15m", "1h", "4h", "1d"],
                &[("BTC/USDT", 65_000.0), ("ETH/USDT", 3_200.0), ("SOL/USDT", 150.0)],
            ),
            SimulatedExchange::new(
                "kraken",
                "Kraken",
                &["1m", "5m", "1h", "1d"],
                &[("BTC/USD", 65_010.0), ("ETH/USD", 3_195.0)],
            ),
            SimulatedExchange::new(
                "coinbase",
                "Coinbase",
                &[],
                &[("BTC/USD", 64_990.0), ("ETH/USD", 3_205.0)],
            ),
        ])
    }
}

#[async_trait]
impl ExchangeConnector for SimulatedConnector {
    fn exchanges(&self) -> Vec<ExchangeInfo> {
        self.exchanges.iter().map(|ex| ex.info.clone()).collect()
    }

    async fn connect(&self, exchange_id: &str) -> UpstreamResult<Box<dyn ExchangeSession>> {
        let exchange = self
            .exchanges
            .iter()
            .find(|ex| ex.info.id == exchange_id)
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound(format!("Exchange '{}' not found.", exchange_id)))?;

        let failure = self.failures.lock().get(exchange_id).cloned();

        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        debug!(exchange = exchange_id, "opened simulated session");

        Ok(Box::new(SimulatedSession {
            exchange,
            failure,
            latency: self.latency,
            fetches: Arc::clone(&self.fetches),
            open_sessions: Arc::clone(&self.open_sessions),
        }))
    }
}

struct SimulatedSession {
    exchange: SimulatedExchange,
    latency: Duration,
    failure: Option<UpstreamError>,
    fetches: Arc<AtomicUsize>,
    open_sessions: Arc<AtomicUsize>,
}

impl SimulatedSession {
    async fn begin_fetch(&self) -> UpstreamResult<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl Drop for SimulatedSession {
    fn drop(&mut self) {
        self.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExchangeSession for SimulatedSession {
    fn info(&self) -> &ExchangeInfo {
        &self.exchange.info
    }

    async fn fetch_ticker(&mut self, symbol: &str) -> UpstreamResult<RawTicker> {
        self.begin_fetch().await?;
        let base = self.exchange.base_price(symbol)?;

        let now = Utc::now();
        let ts = now.timestamp_millis();
        let last = price_at(base, ts);

        Ok(RawTicker {
            symbol: symbol.to_string(),
            timestamp: Some(ts),
            datetime: Some(now.to_rfc3339()),
            high: Some(base * 1.02),
            low: Some(base * 0.98),
            bid: Some(last * 0.9999),
            ask: Some(last * 1.0001),
            last: Some(last),
            volume: Some(volume_at(base, ts)),
        })
    }

    async fn fetch_candles(
        &mut self,
        symbol: &str,
        timeframe: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> UpstreamResult<Vec<RawCandle>> {
        self.begin_fetch().await?;
        let info = &self.exchange.info;
        if !info.has_ohlcv {
            return Err(UpstreamError::Unsupported(format!(
                "Exchange '{}' does not support fetching OHLCV data.",
                info.id
            )));
        }
        let step = timeframe_millis(timeframe)
            .filter(|_| info.supports_timeframe(timeframe))
            .ok_or_else(|| {
                UpstreamError::ExchangeRejected(format!("Invalid timeframe '{}'", timeframe))
            })?;
        let base = self.exchange.base_price(symbol)?;

        let limit = i64::from(limit.unwrap_or(DEFAULT_CANDLE_LIMIT).min(MAX_CANDLE_LIMIT));
        let now = Utc::now().timestamp_millis();
        let start = since.unwrap_or(now - step * limit);
        // Align to the candle grid
        let start = start - start.rem_euclid(step);

        let candles = (0..limit)
            .map(|i| start + i * step)
            .take_while(|open_time| *open_time <= now)
            .map(|open_time| {
                let open = price_at(base, open_time);
                let close = price_at(base, open_time + step);
                RawCandle(
                    open_time,
                    open,
                    open.max(close) * 1.001,
                    open.min(close) * 0.999,
                    close,
                    volume_at(base, open_time),
                )
            })
            .collect();

        Ok(candles)
    }
}

fn price_at(base: f64, ts_millis: i64) -> f64 {
    let phase = ts_millis as f64 / 600_000.0;
    base * (1.0 + 0.01 * phase.sin())
}

fn volume_at(base: f64, ts_millis: i64) -> f64 {
    let phase = ts_millis as f64 / 3_600_000.0;
    (1_000_000.0 / base) * (1.5 + phase.cos())
}

/// Length of a timeframe like `5m` or `4h` in milliseconds.
fn timeframe_millis(timeframe: &str) -> Option<i64> {
    let unit = timeframe.chars().last()?;
    let count: i64 = timeframe[..timeframe.len() - unit.len_utf8()]
        .parse()
        .ok()
        .filter(|n| *n > 0)?;
    let unit_ms = match unit {
        'm' => 60_000,
        'h' => 3_600_000,
        'd' => 86_400_000,
        'w' => 7 * 86_400_000,
        _ => return None,
    };
    Some(count * unit_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_timeframe_millis() {
        assert_eq!(timeframe_millis("1m"), Some(60_000));
        assert_eq!(timeframe_millis("4h"), Some(4 * 3_600_000));
        assert_eq!(timeframe_millis("1d"), Some(86_400_000));
        assert_eq!(timeframe_millis("0m"), None);
        assert_eq!(timeframe_millis("m"), None);
        assert_eq!(timeframe_millis("1y"), None);
        assert_eq!(timeframe_millis(""), None);
    }

    #[test]
    fn test_default_catalog() {
        let connector = SimulatedConnector::default();
        let ids: Vec<String> = connector.exchanges().into_iter().map(|e| e.id).collect();

        assert_eq!(ids, vec!["binance", "kraken", "coinbase"]);
        assert!(connector.has_exchange("kraken"));
        assert!(!connector.has_exchange("mtgox"));
    }

    #[tokio::test]
    async fn test_fetch_ticker() {
        let connector = SimulatedConnector::default();
        let mut session = assert_ok!(connector.connect("binance").await);

        let ticker = assert_ok!(session.fetch_ticker("BTC/USDT").await);
        assert_eq!(ticker.symbol, "BTC/USDT");
        let last = ticker.last.unwrap();
        assert!(last > 60_000.0 && last < 70_000.0);
        assert!(ticker.bid.unwrap() < ticker.ask.unwrap());
        assert_eq!(connector.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_exchange_and_symbol() {
        let connector = SimulatedConnector::default();

        let err = connector.connect("mtgox").await.err().unwrap();
        assert!(matches!(err, UpstreamError::NotFound(_)));

        let mut session = assert_ok!(connector.connect("kraken").await);
        let err = assert_err!(session.fetch_ticker("DOGE/USD").await);
        assert!(matches!(err, UpstreamError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_sessions_released_on_drop() {
        let connector = SimulatedConnector::default();

        let session = assert_ok!(connector.connect("binance").await);
        let other = assert_ok!(connector.connect("kraken").await);
        assert_eq!(connector.open_sessions(), 2);

        drop(session);
        drop(other);
        assert_eq!(connector.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let connector = SimulatedConnector::default();
        connector.set_failure("binance", Some(UpstreamError::Network("reset".into())));

        let mut session = assert_ok!(connector.connect("binance").await);
        let err = assert_err!(session.fetch_ticker("BTC/USDT").await);
        assert_eq!(err, UpstreamError::Network("reset".into()));
        drop(session);

        connector.set_failure("binance", None);
        let mut session = assert_ok!(connector.connect("binance").await);
        assert_ok!(session.fetch_ticker("BTC/USDT").await);
    }

    #[tokio::test]
    async fn test_fetch_candles_respects_limit_and_grid() {
        let connector = SimulatedConnector::default();
        let mut session = assert_ok!(connector.connect("binance").await);

        let candles = assert_ok!(session.fetch_candles("ETH/USDT", "1h", None, Some(24)).await);
        assert_eq!(candles.len(), 24);
        for pair in candles.windows(2) {
            assert_eq!(pair[1].0 - pair[0].0, 3_600_000);
        }
        for RawCandle(ts, open, high, low, close, volume) in &candles {
            assert_eq!(ts % 3_600_000, 0);
            assert!(high >= open && high >= close);
            assert!(low <= open && low <= close);
            assert!(*volume > 0.0);
        }
    }

    #[tokio::test]
    async fn test_fetch_candles_from_future_is_empty() {
        let connector = SimulatedConnector::default();
        let mut session = assert_ok!(connector.connect("binance").await);

        let future = Utc::now().timestamp_millis() + 86_400_000;
        let candles = assert_ok!(session.fetch_candles("BTC/USDT", "1m", Some(future), None).await);
        assert!(candles.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_candles_unsupported() {
        let connector = SimulatedConnector::default();

        let mut session = assert_ok!(connector.connect("coinbase").await);
        let err = assert_err!(session.fetch_candles("BTC/USD", "1d", None, None).await);
        assert!(matches!(err, UpstreamError::Unsupported(_)));

        let mut session = assert_ok!(connector.connect("kraken").await);
        let err = assert_err!(session.fetch_candles("BTC/USD", "4h", None, None).await);
        assert!(matches!(err, UpstreamError::ExchangeRejected(_)));
    }
}
