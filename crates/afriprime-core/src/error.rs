//! Verification error taxonomy.

use serde::Serialize;

/// Why a payload was not accepted as authentic.
///
/// Expected failures (a bad signature, a garbled payload) are values of this
/// type, never panics. Only [`VerifyError::NotConfigured`] points at the
/// deployment rather than at the sender.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// The payload could not be parsed into the expected shape.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// No signature field or header was present.
    #[error("missing signature")]
    MissingSignature,

    /// A signature was present but does not match the payload.
    #[error("invalid signature")]
    InvalidSignature,

    /// The secret needed to verify this payload is not configured.
    #[error("not configured: {0}")]
    NotConfigured(&'static str),

    /// The signed timestamp is outside the accepted tolerance window.
    #[error("stale delivery: signature timestamp is {age_secs}s off the local clock")]
    StaleDelivery {
        /// Seconds between the signed timestamp and the local clock.
        /// Positive values are in the past.
        age_secs: i64,
    },
}

impl VerifyError {
    /// Stable snake_case classification, safe to return to callers and to use
    /// as a log/metric label.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "malformed_input",
            Self::MissingSignature => "missing_signature",
            Self::InvalidSignature => "invalid_signature",
            Self::NotConfigured(_) => "not_configured",
            Self::StaleDelivery { .. } => "stale_delivery",
        }
    }

    /// True when the failure is a deployment problem, not a client one.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }
}

/// Flat, serialisable outcome of a verification attempt.
///
/// Useful for callers that report results rather than branch on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    /// Whether the payload is authentic.
    pub authentic: bool,
    /// Failure classification when not authentic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    /// Human-readable detail for the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&VerifyError> for VerificationResult {
    fn from(err: &VerifyError) -> Self {
        Self {
            authentic: false,
            reason: Some(err.code()),
            detail: Some(err.to_string()),
        }
    }
}

impl<T> From<&Result<T, VerifyError>> for VerificationResult {
    fn from(result: &Result<T, VerifyError>) -> Self {
        match result {
            Ok(_) => Self {
                authentic: true,
                reason: None,
                detail: None,
            },
            Err(e) => Self::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_keep_the_three_caller_classes_apart() {
        let malformed = VerifyError::MalformedInput("x".into()).code();
        let invalid = VerifyError::InvalidSignature.code();
        let unconfigured = VerifyError::NotConfigured("bot token").code();

        assert_ne!(malformed, invalid);
        assert_ne!(invalid, unconfigured);
        assert_ne!(malformed, unconfigured);
    }

    #[test]
    fn only_not_configured_is_a_configuration_error() {
        assert!(VerifyError::NotConfigured("stripe").is_configuration_error());
        assert!(!VerifyError::InvalidSignature.is_configuration_error());
        assert!(!VerifyError::MissingSignature.is_configuration_error());
        assert!(!VerifyError::StaleDelivery { age_secs: 900 }.is_configuration_error());
    }

    #[test]
    fn result_from_ok() {
        let ok: Result<(), VerifyError> = Ok(());
        let result = VerificationResult::from(&ok);
        assert!(result.authentic);
        assert!(result.reason.is_none());
    }

    #[test]
    fn result_from_err_carries_code() {
        let err: Result<(), VerifyError> = Err(VerifyError::InvalidSignature);
        let result = VerificationResult::from(&err);
        assert!(!result.authentic);
        assert_eq!(result.reason, Some("invalid_signature"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["authentic"], false);
        assert_eq!(json["reason"], "invalid_signature");
    }

    #[test]
    fn stale_delivery_displays_age() {
        let err = VerifyError::StaleDelivery { age_secs: 301 };
        assert_eq!(
            err.to_string(),
            "stale delivery: signature timestamp is 301s off the local clock"
        );
    }
}
