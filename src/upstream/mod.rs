//! Upstream Module
//!
//! Boundary to the exchange adapters the gateway fetches market data from.
//!
//! An [`ExchangeConnector`] knows the finite set of exchanges it can reach and
//! opens one [`ExchangeSession`] per upstream call. Sessions release whatever
//! they hold when dropped, so cleanup happens on success, error, timeout and
//! cancellation alike.

mod simulated;
mod types;

use async_trait::async_trait;

pub use simulated::{SimulatedConnector, SimulatedExchange};
pub use types::{ExchangeInfo, RawCandle, RawTicker, UpstreamError};

/// Result type for adapter calls.
pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;

/// Opens sessions against a fixed catalog of exchanges.
#[async_trait]
pub trait ExchangeConnector: Send + Sync {
    /// Every exchange this connector can reach.
    fn exchanges(&self) -> Vec<ExchangeInfo>;

    fn has_exchange(&self, exchange_id: &str) -> bool {
        self.exchanges().iter().any(|info| info.id == exchange_id)
    }

    /// Opens a session with `exchange_id`.
    async fn connect(&self, exchange_id: &str) -> UpstreamResult<Box<dyn ExchangeSession>>;
}

/// A live connection to one exchange.
#[async_trait]
pub trait ExchangeSession: Send {
    fn info(&self) -> &ExchangeInfo;

    async fn fetch_ticker(&mut self, symbol: &str) -> UpstreamResult<RawTicker>;

    async fn fetch_candles(
        &mut self,
        symbol: &str,
        timeframe: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> UpstreamResult<Vec<RawCandle>>;
}
