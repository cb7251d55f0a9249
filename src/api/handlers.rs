//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use crate::cache::CacheStats;
use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::models::{
    Candle, HealthResponse, HistoricalQuery, MessageResponse, ResetRateLimitQuery,
    ResetRateLimitResponse, RootResponse, Ticker,
};
use crate::rate_limit::RateLimiter;
use crate::service::MarketDataService;
use crate::upstream::{ExchangeConnector, ExchangeInfo};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MarketDataService>,
    pub limiter: Arc<RateLimiter>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(service: MarketDataService, limiter: RateLimiter, config: Config) -> Self {
        Self {
            service: Arc::new(service),
            limiter: Arc::new(limiter),
            config: Arc::new(config),
        }
    }

    /// Builds the service and limiter from configuration.
    pub fn from_config(config: &Config, connector: Arc<dyn ExchangeConnector>) -> Self {
        let service = MarketDataService::from_config(config, connector);
        let limiter = RateLimiter::new(config.rate_limit_requests, config.rate_limit_period());
        Self::new(service, limiter, config.clone())
    }
}

/// Handler for GET /
pub async fn root_handler(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse::new(
        &state.config.app_name,
        &state.config.app_version,
    ))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        &state.config.app_version,
        state.service.cache_stats(),
    ))
}

/// Handler for GET /exchanges
pub async fn exchanges_handler(State(state): State<AppState>) -> Json<Vec<ExchangeInfo>> {
    Json(state.service.list_exchanges())
}

/// Handler for GET /price/:exchange_id/:symbol
pub async fn price_handler(
    State(state): State<AppState>,
    Path((exchange_id, symbol)): Path<(String, String)>,
) -> Result<Json<Ticker>> {
    let ticker = state.service.get_ticker(&exchange_id, &symbol).await?;
    Ok(Json(ticker))
}

/// Handler for GET /historical/:exchange_id/:symbol
pub async fn historical_handler(
    State(state): State<AppState>,
    Path((exchange_id, symbol)): Path<(String, String)>,
    Query(query): Query<HistoricalQuery>,
) -> Result<Json<Vec<Candle>>> {
    if let Some(error_msg) = query.validate() {
        return Err(GatewayError::InvalidRequest(error_msg));
    }

    let candles = state
        .service
        .get_historical(
            &exchange_id,
            &symbol,
            &query.timeframe,
            query.since,
            query.limit,
        )
        .await?;
    Ok(Json(candles))
}

// == Admin ==

/// Handler for POST /admin/clear-cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.service.clear_caches();
    Json(MessageResponse::new("All caches cleared successfully"))
}

/// Handler for GET /admin/cache-stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.service.cache_stats())
}

/// Handler for POST /admin/reset-rate-limit
pub async fn reset_rate_limit_handler(
    State(state): State<AppState>,
    Query(query): Query<ResetRateLimitQuery>,
) -> Json<ResetRateLimitResponse> {
    let client_id = query.client_id.as_deref();
    let cleared = state.limiter.reset(client_id);
    info!(client = client_id.unwrap_or("*"), cleared, "rate limit reset");
    Json(ResetRateLimitResponse::new(client_id, cleared))
}
