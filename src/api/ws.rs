//! WebSocket ticker stream.
//!
//! One poller task per connection pushes tickers through a channel; this
//! side forwards them to the socket and watches for the client leaving.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::handlers::AppState;
use crate::error::{GatewayError, Result};
use crate::models::StreamQuery;
use crate::service::MarketDataService;
use crate::tasks::{poll_ticker, StreamMessage};

/// Handler for GET /ws/:exchange_id/:symbol
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path((exchange_id, symbol)): Path<(String, String)>,
    Query(query): Query<StreamQuery>,
) -> Result<Response> {
    let interval = query
        .resolve(&state.config)
        .map_err(GatewayError::InvalidRequest)?;

    let service = Arc::clone(&state.service);
    Ok(ws.on_upgrade(move |socket| handle_stream(socket, service, exchange_id, symbol, interval)))
}

async fn handle_stream(
    socket: WebSocket,
    service: Arc<MarketDataService>,
    exchange_id: String,
    symbol: String,
    interval: Duration,
) {
    info!(
        exchange = %exchange_id,
        symbol = %symbol,
        interval_secs = interval.as_secs(),
        "ticker stream opened"
    );

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<StreamMessage>(16);
    let poller = tokio::spawn(poll_ticker(
        service,
        exchange_id.clone(),
        symbol.clone(),
        interval,
        tx,
    ));

    loop {
        tokio::select! {
            outgoing = rx.recv() => {
                let Some(msg) = outgoing else { break };
                let is_error = msg.is_error();
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(error = %e, "failed to encode stream message");
                        break;
                    }
                };
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
                if is_error {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Client frames other than Close carry no meaning here
                Some(Ok(_)) => {}
            },
        }
    }

    // Closing the channel stops the poller and any fetch it has in flight
    drop(rx);
    poller.abort();

    info!(exchange = %exchange_id, symbol = %symbol, "ticker stream closed");
}
