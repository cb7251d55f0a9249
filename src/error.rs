//! Error types for the gateway
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::upstream::UpstreamError;

// == Gateway Error Enum ==
/// Unified error type for the gateway.
///
/// Each variant tells the client whether retrying can help: `Transient` and
/// `RateLimited` are retryable, the rest are not.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// Unknown exchange, symbol or timeframe
    #[error("{0}")]
    NotFound(String),

    /// Feature not offered by the upstream exchange
    #[error("{0}")]
    Unsupported(String),

    /// Network trouble or timeout talking to the upstream exchange
    #[error("{0}")]
    Transient(String),

    /// The upstream exchange rejected the request
    #[error("{0}")]
    UpstreamRejected(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Client exhausted its request quota
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited { retry_after: Duration },

    /// Anything else
    #[error("{0}")]
    Unknown(String),
}

impl GatewayError {
    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::NotFound(_) => "NotFound",
            GatewayError::Unsupported(_) => "Unsupported",
            GatewayError::Transient(_) => "Transient",
            GatewayError::UpstreamRejected(_) => "UpstreamRejected",
            GatewayError::InvalidRequest(_) => "InvalidRequest",
            GatewayError::RateLimited { .. } => "RateLimited",
            GatewayError::Unknown(_) => "Unknown",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Unsupported(_)
            | GatewayError::UpstreamRejected(_)
            | GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::Transient(_) | GatewayError::RateLimited { .. }
        )
    }

    /// Retry hint in whole seconds, rounded up.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            GatewayError::RateLimited { retry_after } => {
                Some(retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0))
            }
            _ => None,
        }
    }
}

// == Upstream Conversion ==
impl From<UpstreamError> for GatewayError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::NotFound(msg) => GatewayError::NotFound(msg),
            UpstreamError::Unsupported(msg) => GatewayError::Unsupported(msg),
            UpstreamError::Network(msg) => GatewayError::Transient(msg),
            UpstreamError::ExchangeRejected(msg) => GatewayError::UpstreamRejected(msg),
            UpstreamError::Unknown(msg) => GatewayError::Unknown(msg),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let retry_after = self.retry_after_secs();
        let body = Json(ErrorResponse::from_error(&self));

        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

// == Result Type Alias ==
/// Convenience Result type for the gateway.
pub type Result<T> = std::result::Result<T, GatewayError>;
