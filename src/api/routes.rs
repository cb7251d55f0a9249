//! API Routes
//!
//! Configures the Axum router with all gateway endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, clear_cache_handler, exchanges_handler, health_handler,
    historical_handler, price_handler, reset_rate_limit_handler, root_handler, AppState,
};
use super::middleware::rate_limit;
use super::ws::ws_handler;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /` - Service info
/// - `GET /health` - Health check with cache stats
/// - `GET /exchanges` - Exchange catalog
/// - `GET /price/:exchange_id/:symbol` - Latest ticker (rate limited)
/// - `GET /historical/:exchange_id/:symbol` - OHLCV candles (rate limited)
/// - `GET /ws/:exchange_id/:symbol` - WebSocket ticker stream
/// - `POST /admin/clear-cache`, `GET /admin/cache-stats`, `POST /admin/reset-rate-limit`
///
/// # Middleware
/// - Rate limiting: per client IP, market data routes only
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let market = Router::new()
        .route("/price/:exchange_id/:symbol", get(price_handler))
        .route("/historical/:exchange_id/:symbol", get(historical_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    let admin = Router::new()
        .route("/clear-cache", post(clear_cache_handler))
        .route("/cache-stats", get(cache_stats_handler))
        .route("/reset-rate-limit", post(reset_rate_limit_handler));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/exchanges", get(exchanges_handler))
        .route("/ws/:exchange_id/:symbol", get(ws_handler))
        .merge(market)
        .nest("/admin", admin)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
