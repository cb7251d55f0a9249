//! Rate-limit middleware for the market data routes.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::handlers::AppState;
use crate::error::GatewayError;
use crate::rate_limit::{RateDecision, UNKNOWN_CLIENT};

/// Client identity used for rate limiting: the peer IP address.
///
/// Requests without connection info all share the `unknown` bucket.
pub fn client_id(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Charges one request against the caller's bucket, or answers 429.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let client = client_id(&request);

    match state.limiter.check(&client) {
        RateDecision::Allowed { remaining } => {
            debug!(client = %client, remaining, "request admitted");
            Ok(next.run(request).await)
        }
        RateDecision::Rejected { retry_after } => {
            debug!(client = %client, path = %request.uri().path(), "request rate limited");
            Err(GatewayError::RateLimited { retry_after })
        }
    }
}
