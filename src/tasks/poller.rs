//! Ticker Poller
//!
//! Drives a ticker stream: fetch through the service, push the result down a
//! channel, sleep, repeat. The WebSocket handler owns the receiving end.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::GatewayError;
use crate::models::Ticker;
use crate::service::MarketDataService;

/// One frame of a ticker stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StreamMessage {
    Ticker(Ticker),
    Error { error: String, status_code: u16 },
}

impl StreamMessage {
    pub fn from_error(err: &GatewayError) -> Self {
        StreamMessage::Error {
            error: err.to_string(),
            status_code: err.status_code().as_u16(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StreamMessage::Error { .. })
    }
}

/// Polls one ticker every `interval` until the receiver goes away or a fetch
/// fails.
///
/// A failure is sent as a final [`StreamMessage::Error`]. Closing the
/// receiver cancels an in-flight fetch as well as the sleep between polls.
pub async fn poll_ticker(
    service: Arc<MarketDataService>,
    exchange_id: String,
    symbol: String,
    interval: Duration,
    tx: mpsc::Sender<StreamMessage>,
) {
    loop {
        let result = tokio::select! {
            _ = tx.closed() => break,
            result = service.get_ticker(&exchange_id, &symbol) => result,
        };

        match result {
            Ok(ticker) => {
                if tx.send(StreamMessage::Ticker(ticker)).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                let _ = tx.send(StreamMessage::from_error(&err)).await;
                break;
            }
        }

        tokio::select! {
            _ = tx.closed() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    debug!(exchange = %exchange_id, symbol = %symbol, "ticker poller stopped");
}
