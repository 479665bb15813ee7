//! Paystack webhook signature verification.
//!
//! Paystack sends `X-Paystack-Signature: <hex>` where the value is
//! HMAC-SHA512 of the exact request body keyed by the account's secret key.
//! There is no timestamp, so replay protection rests on recording processed
//! event references downstream.

use crate::crypto::{constant_time_eq, hmac_sha512_hex, normalize_hex};
use crate::error::VerifyError;
use crate::secret::SecretMaterial;
use crate::webhook::{
    Assurance, DevBypass, Provider, VerifiedEvent, WebhookEnvelope, WebhookVerifier,
};

/// Lowercase name of Paystack's signature header.
pub const PAYSTACK_SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Verifier for Paystack webhooks.
#[derive(Debug, Clone)]
pub struct PaystackVerifier {
    secret: Option<SecretMaterial>,
    bypass: DevBypass,
}

impl PaystackVerifier {
    /// Create a verifier.
    #[must_use]
    pub fn new(secret: Option<SecretMaterial>, bypass: DevBypass) -> Self {
        Self { secret, bypass }
    }

    fn classify(body: &[u8], assurance: Assurance) -> Result<VerifiedEvent, VerifyError> {
        VerifiedEvent::from_authentic_body(Provider::Paystack, assurance, body, "event", |event| {
            let data = event.get("data")?;
            data.get("reference")
                .and_then(serde_json::Value::as_str)
                .map(String::from)
                .or_else(|| match data.get("id")? {
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    serde_json::Value::String(s) => Some(s.clone()),
                    _ => None,
                })
        })
    }
}

impl WebhookVerifier for PaystackVerifier {
    fn provider(&self) -> Provider {
        Provider::Paystack
    }

    fn signature_header(&self) -> &'static str {
        PAYSTACK_SIGNATURE_HEADER
    }

    fn verify(&self, envelope: &WebhookEnvelope<'_>) -> Result<VerifiedEvent, VerifyError> {
        let Some(secret) = &self.secret else {
            if self.bypass.is_enabled() {
                return Self::classify(envelope.body, Assurance::DevelopmentBypass);
            }
            return Err(VerifyError::NotConfigured("paystack secret key"));
        };

        let provided = normalize_hex(envelope.require_signature()?);
        let expected = hmac_sha512_hex(secret.expose(), envelope.body);

        if !constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
            return Err(VerifyError::InvalidSignature);
        }

        Self::classify(envelope.body, Assurance::Signed)
    }
}

/// Coarse classification of Paystack event types the service reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaystackEventKind {
    /// `charge.success`
    ChargeSuccess,
    /// `transfer.success`
    TransferSuccess,
    /// `transfer.failed` or `transfer.reversed`
    TransferFailed,
    /// Anything else.
    Other,
}

impl PaystackEventKind {
    /// Classify a Paystack event type string.
    #[must_use]
    pub fn classify(event_type: &str) -> Self {
        match event_type {
            "charge.success" => Self::ChargeSuccess,
            "transfer.success" => Self::TransferSuccess,
            "transfer.failed" | "transfer.reversed" => Self::TransferFailed,
            _ => Self::Other,
        }
    }
}

/// Compute the `X-Paystack-Signature` value for `body`.
///
/// Used by tests and local tooling to produce deliveries the verifier accepts.
#[must_use]
pub fn sign_payload(secret: &SecretMaterial, body: &[u8]) -> String {
    hmac_sha512_hex(secret.expose(), body)
}
