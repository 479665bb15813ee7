//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use afriprime_core::{ProfileError, VerificationResult, VerifyError};
use afriprime_store::StoreError;

use crate::stripe::StripeError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A signed payload was rejected.
    #[error(transparent)]
    Verification(#[from] VerifyError),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A feature needs configuration that is absent.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

/// JSON error response body.
///
/// Verification failures also carry the flat `authentic`/`reason` outcome.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    #[serde(flatten)]
    verification: Option<VerificationResult>,
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

/// HTTP status for a verification failure.
const fn verification_status(err: &VerifyError) -> StatusCode {
    match err {
        VerifyError::MalformedInput(_) | VerifyError::MissingSignature => StatusCode::BAD_REQUEST,
        VerifyError::InvalidSignature | VerifyError::StaleDelivery { .. } => {
            StatusCode::UNAUTHORIZED
        }
        VerifyError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl ApiError {
    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Verification(err) => verification_status(err),
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Stable error code returned in the response body.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Verification(err) => err.code(),
            Self::BadRequest(_) => "bad_request",
            Self::NotConfigured(_) => "not_configured",
            Self::Internal(_) => "internal_error",
            Self::ExternalService(_) => "external_service_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, details) = match &self {
            Self::Verification(VerifyError::StaleDelivery { age_secs }) => (
                self.to_string(),
                Some(serde_json::json!({ "age_secs": age_secs })),
            ),
            Self::Verification(_) | Self::NotConfigured(_) => (self.to_string(), None),
            Self::BadRequest(msg) | Self::ExternalService(msg) => (msg.clone(), None),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                ("An internal error occurred".to_string(), None)
            }
        };

        let verification = match &self {
            Self::Verification(err) => Some(VerificationResult::from(err)),
            _ => None,
        };

        let body = ErrorResponse {
            verification,
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEvent { event_id } => {
                Self::Internal(format!("unexpected duplicate event {event_id}"))
            }
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<StripeError> for ApiError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::Configuration(msg) => Self::NotConfigured(msg),
            other => Self::ExternalService(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_failures_keep_distinct_statuses() {
        let cases = [
            (VerifyError::MalformedInput("x".into()), 400, "malformed_input"),
            (VerifyError::MissingSignature, 400, "missing_signature"),
            (VerifyError::InvalidSignature, 401, "invalid_signature"),
            (VerifyError::StaleDelivery { age_secs: 900 }, 401, "stale_delivery"),
            (VerifyError::NotConfigured("stripe webhook secret"), 503, "not_configured"),
        ];

        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status().as_u16(), status);
            assert_eq!(api.code(), code);
        }
    }

    #[tokio::test]
    async fn verification_body_reports_outcome() {
        let response = ApiError::from(VerifyError::InvalidSignature).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["authentic"], false);
        assert_eq!(body["reason"], "invalid_signature");
        assert_eq!(body["error"]["code"], "invalid_signature");
    }

    #[tokio::test]
    async fn other_errors_omit_outcome() {
        let response = ApiError::BadRequest("nope".into()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert!(body.get("authentic").is_none());
        assert_eq!(body["error"]["code"], "bad_request");
    }

    #[test]
    fn store_errors_are_internal() {
        let api = ApiError::from(StoreError::Database("disk full".into()));
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn upstream_stripe_errors_are_bad_gateway() {
        let api = ApiError::from(StripeError::Api {
            error_type: "invalid_request_error".into(),
            message: "No such price".into(),
            code: None,
        });
        assert_eq!(api.status(), StatusCode::BAD_GATEWAY);
    }
}
