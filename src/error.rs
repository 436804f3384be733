//! Service error types with HTTP status code mapping.
//!
//! [`SapError`] is the central error type. Each variant maps to an HTTP
//! status code and a fixed public message; the internal detail carried by
//! the variant is logged server-side and never echoed to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// { "error": "Failed to track prompt" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Fixed, client-safe error message.
    pub error: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// | Variant                  | HTTP Status | Public message                           |
/// |--------------------------|-------------|------------------------------------------|
/// | `InvalidTrackingRequest` | 400         | Invalid tracking request                 |
/// | `InvalidRequest`         | 400         | Invalid request                          |
/// | `InvalidSignature`       | 400         | Webhook signature verification failed    |
/// | `TrackingFailed`         | 500         | Failed to track prompt                   |
/// | `Persistence`            | 500         | Database error                           |
/// | `Checkout`               | 500         | Failed to create checkout session        |
/// | `Completion`             | 500         | Failed to generate AI response           |
/// | `EmptyCompletion`        | 500         | Failed to generate response              |
/// | `Internal`               | 500         | Internal server error                    |
#[derive(Debug, thiserror::Error)]
pub enum SapError {
    /// A tracking payload was malformed or carried negative amounts.
    #[error("invalid tracking request: {0}")]
    InvalidTrackingRequest(String),

    /// Any other request body failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Payment webhook signature did not verify.
    #[error("webhook signature verification failed: {0}")]
    InvalidSignature(String),

    /// A tracking event could not be durably recorded (strict mode).
    #[error("failed to track prompt: {0}")]
    TrackingFailed(String),

    /// Durable store failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Payment provider call failed.
    #[error("checkout session error: {0}")]
    Checkout(String),

    /// Completion API call failed.
    #[error("completion error: {0}")]
    Completion(String),

    /// Completion API answered without any choices.
    #[error("completion returned no choices")]
    EmptyCompletion,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SapError {
    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidTrackingRequest(_)
            | Self::InvalidRequest(_)
            | Self::InvalidSignature(_) => StatusCode::BAD_REQUEST,
            Self::TrackingFailed(_)
            | Self::Persistence(_)
            | Self::Checkout(_)
            | Self::Completion(_)
            | Self::EmptyCompletion
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the fixed message sent to clients for this variant.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidTrackingRequest(_) => "Invalid tracking request",
            Self::InvalidRequest(_) => "Invalid request",
            Self::InvalidSignature(_) => "Webhook signature verification failed",
            Self::TrackingFailed(_) => "Failed to track prompt",
            Self::Persistence(_) => "Database error",
            Self::Checkout(_) => "Failed to create checkout session",
            Self::Completion(_) => "Failed to generate AI response",
            Self::EmptyCompletion => "Failed to generate response",
            Self::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for SapError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        let body = ErrorResponse {
            error: self.public_message().to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}
