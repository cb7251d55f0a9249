//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::error::GatewayError;

/// Response body for `GET /`
#[derive(Debug, Clone, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub health: String,
    pub exchanges: String,
}

impl RootResponse {
    pub fn new(app_name: &str, version: &str) -> Self {
        Self {
            message: format!("{} is running", app_name),
            version: version.to_string(),
            health: "/health".to_string(),
            exchanges: "/exchanges".to_string(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub version: String,
    pub cache_stats: CacheStats,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(version: &str, cache_stats: CacheStats) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: version.to_string(),
            cache_stats,
        }
    }
}

/// Plain confirmation message
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for `POST /admin/reset-rate-limit`
#[derive(Debug, Clone, Serialize)]
pub struct ResetRateLimitResponse {
    pub message: String,
    /// Number of client buckets dropped
    pub buckets_cleared: usize,
}

impl ResetRateLimitResponse {
    pub fn new(client_id: Option<&str>, buckets_cleared: usize) -> Self {
        let message = match client_id {
            Some(id) => format!("Rate limit reset for client '{}'", id),
            None => "Rate limits reset for all clients".to_string(),
        };
        Self {
            message,
            buckets_cleared,
        }
    }
}

/// Error response body for all error conditions
///
/// Carries enough structure for a client to decide whether to retry.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error kind, e.g. "NotFound" or "Transient"
    pub error: String,
    /// Human-readable description
    pub detail: String,
    pub status_code: u16,
    pub retryable: bool,
    /// Seconds to wait before retrying, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn from_error(err: &GatewayError) -> Self {
        Self {
            error: err.kind().to_string(),
            detail: err.to_string(),
            status_code: err.status_code().as_u16(),
            retryable: err.is_retryable(),
            retry_after: err.retry_after_secs(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
