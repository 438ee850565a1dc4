use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type for pricing operations
pub type PricingResult<T> = Result<T, PricingError>;

/// Errors that can occur in the pricing domain
#[derive(Debug, Error)]
pub enum PricingError {
    /// A required argument is missing, empty or out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Estimation, instance type or flavor not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The catalog could not price a requested runtime
    #[error("Pricing lookup failed for {instance_type} ({flavor_name}): {reason}")]
    PricingLookupFailed {
        instance_type: String,
        flavor_name: String,
        reason: String,
    },

    /// The upstream pricing source could not be reached or answered with an error
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PricingError {
    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, PricingError::UpstreamUnavailable(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PricingError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            PricingError::NotFound(_) => StatusCode::NOT_FOUND,
            PricingError::PricingLookupFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PricingError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            PricingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for PricingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PricingError::Internal(format!("failed to decode response: {}", err))
        } else if err.is_timeout() {
            PricingError::UpstreamUnavailable(format!("request timed out: {}", err))
        } else {
            PricingError::UpstreamUnavailable(format!("failed to fetch instances: {}", err))
        }
    }
}

impl IntoResponse for PricingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            PricingError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal pricing error");
                "Internal error".to_string()
            }
            PricingError::UpstreamUnavailable(msg) => {
                tracing::warn!(error = %msg, "Pricing source unavailable");
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}
