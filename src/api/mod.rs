//! API Module
//!
//! HTTP handlers and routing for the gateway REST and WebSocket API.
//!
//! # Endpoints
//! - `GET /` - Service info
//! - `GET /health` - Health check endpoint
//! - `GET /exchanges` - Supported exchanges
//! - `GET /price/:exchange_id/:symbol` - Latest ticker
//! - `GET /historical/:exchange_id/:symbol` - OHLCV candles
//! - `GET /ws/:exchange_id/:symbol` - Ticker stream
//! - `/admin/*` - Cache and rate-limit administration

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod ws;

pub use handlers::*;
pub use routes::create_router;
