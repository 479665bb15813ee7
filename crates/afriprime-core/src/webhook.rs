//! Shared webhook contract.
//!
//! Both payment providers deliver an HTTP POST whose raw body is signed
//! out-of-band in a header. A verifier takes the untouched bytes plus the
//! header value and either authenticates and classifies the event or says
//! why it cannot.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VerifyError;

/// A payment provider that delivers webhooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Stripe (timestamped HMAC-SHA256 signature header).
    Stripe,
    /// Paystack (HMAC-SHA512 over the raw body).
    Paystack,
}

impl Provider {
    /// Lowercase provider name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Paystack => "paystack",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw webhook delivery: the exact request bytes plus the signature header.
///
/// The body is borrowed and must be the bytes received on the wire. Parsing
/// and re-serialising JSON before verification changes whitespace and key
/// order and breaks the signature.
#[derive(Debug, Clone, Copy)]
pub struct WebhookEnvelope<'a> {
    /// Unparsed request body.
    pub body: &'a [u8],
    /// Value of the provider's signature header, if sent.
    pub signature: Option<&'a str>,
}

impl<'a> WebhookEnvelope<'a> {
    /// Build an envelope from a body and an optional header value.
    #[must_use]
    pub const fn new(body: &'a [u8], signature: Option<&'a str>) -> Self {
        Self { body, signature }
    }

    /// The signature header, treating an empty value as missing.
    pub(crate) fn require_signature(&self) -> Result<&'a str, VerifyError> {
        self.signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(VerifyError::MissingSignature)
    }
}

/// How much trust a verified result carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assurance {
    /// The signature was checked against a configured secret.
    Signed,
    /// No secret is configured and the development bypass let the payload
    /// through unchecked. Never enabled in production.
    DevelopmentBypass,
}

/// Development escape hatch for verifiers with no secret configured.
///
/// Separate from the secret itself so that a missing secret alone can never
/// open the door.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DevBypass {
    /// Missing secrets fail closed with `NotConfigured`.
    #[default]
    Disabled,
    /// Missing secrets let payloads through with
    /// [`Assurance::DevelopmentBypass`].
    AllowUnsigned,
}

impl DevBypass {
    /// Map a boolean flag to a bypass setting.
    #[must_use]
    pub const fn from_flag(enabled: bool) -> Self {
        if enabled {
            Self::AllowUnsigned
        } else {
            Self::Disabled
        }
    }

    /// Whether unsigned payloads may pass when no secret is configured.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::AllowUnsigned)
    }
}

/// An authenticated, classified webhook event.
///
/// The verifier does not interpret business meaning; `payload` is the full
/// event document for the caller to act on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedEvent {
    /// Provider that sent the event.
    pub provider: Provider,
    /// Whether the event was signature-checked.
    pub assurance: Assurance,
    /// Provider event type, e.g. `checkout.session.completed` or `charge.success`.
    pub event_type: String,
    /// Provider event identifier used for idempotency, when the provider sends one.
    pub event_id: Option<String>,
    /// The parsed event document.
    pub payload: serde_json::Value,
}

impl VerifiedEvent {
    /// Parse an already-authenticated body.
    ///
    /// `type_field` names the event-type discriminator; `event_id` extracts
    /// the provider's idempotency key from the parsed document.
    pub(crate) fn from_authentic_body(
        provider: Provider,
        assurance: Assurance,
        body: &[u8],
        type_field: &str,
        event_id: impl FnOnce(&serde_json::Value) -> Option<String>,
    ) -> Result<Self, VerifyError> {
        let payload: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| VerifyError::malformed(format!("body is not JSON: {e}")))?;

        let event_type = payload
            .get(type_field)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| VerifyError::malformed(format!("missing `{type_field}` field")))?
            .to_string();

        Ok(Self {
            provider,
            assurance,
            event_type,
            event_id: event_id(&payload),
            payload,
        })
    }
}

/// A provider-specific webhook verifier.
pub trait WebhookVerifier: Send + Sync {
    /// The provider this verifier authenticates.
    fn provider(&self) -> Provider;

    /// Lowercase name of the HTTP header carrying the signature.
    fn signature_header(&self) -> &'static str;

    /// Authenticate the envelope and classify the event.
    ///
    /// # Errors
    ///
    /// - `NotConfigured` if no secret is set and the bypass is disabled
    /// - `MissingSignature` if the header is absent
    /// - `MalformedInput` if the header or (authentic) body cannot be parsed
    /// - `InvalidSignature` if no signature matches
    /// - `StaleDelivery` if the signed timestamp is outside the window
    fn verify(&self, envelope: &WebhookEnvelope<'_>) -> Result<VerifiedEvent, VerifyError>;
}

/// Marker recorded once a verified event has been acted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedEvent {
    /// Provider that sent the event.
    pub provider: Provider,
    /// Provider event identifier.
    pub event_id: String,
    /// Provider event type.
    pub event_type: String,
    /// When the event was processed.
    pub received_at: DateTime<Utc>,
}

impl ProcessedEvent {
    /// Build a marker for `event`, stamped now.
    ///
    /// Returns `None` when the event carries no identifier to key on.
    #[must_use]
    pub fn for_event(event: &VerifiedEvent) -> Option<Self> {
        let event_id = event.event_id.clone()?;
        Some(Self {
            provider: event.provider,
            event_id,
            event_type: event.event_type.clone(),
            received_at: Utc::now(),
        })
    }
}
