//! Stripe webhook signature verification.
//!
//! Stripe signs `"{timestamp}.{raw body}"` with HMAC-SHA256 and sends
//! `Stripe-Signature: t=<unix>,v1=<hex>[,v1=<hex>...]`. More than one `v1`
//! appears while a signing secret is being rolled. The timestamp is bounded
//! by a tolerance window to reject replays of old deliveries.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::crypto::{constant_time_eq, hmac_sha256_hex_parts, normalize_hex};
use crate::error::VerifyError;
use crate::secret::SecretMaterial;
use crate::webhook::{
    Assurance, DevBypass, Provider, VerifiedEvent, WebhookEnvelope, WebhookVerifier,
};

/// Lowercase name of Stripe's signature header.
pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// Default tolerance between the signed timestamp and the local clock.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

/// Parsed components of a `Stripe-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripeSignatureHeader {
    /// Unix timestamp the signature was generated at.
    pub timestamp: i64,
    /// Every `v1` signature, lowercase hex.
    pub v1_signatures: Vec<String>,
}

impl StripeSignatureHeader {
    /// Parse a `Stripe-Signature` header.
    ///
    /// Format: `t=<timestamp>,v1=<signature>[,v1=<signature>...][,v0=<legacy>]`.
    /// `v0` and unknown schemes are ignored.
    ///
    /// # Errors
    ///
    /// - `MalformedInput` if an element has no `=` or the timestamp is missing
    ///   or not an integer
    /// - `MissingSignature` if there is no `v1` element
    pub fn parse(header: &str) -> Result<Self, VerifyError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| VerifyError::malformed("invalid signature header element"))?;

            match key {
                "t" => {
                    timestamp = Some(
                        value
                            .parse()
                            .map_err(|_| VerifyError::malformed("invalid signature timestamp"))?,
                    );
                }
                "v1" => v1_signatures.push(normalize_hex(value)),
                _ => {
                    // v0 is a test-mode scheme; others are forward-compatible additions.
                }
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| VerifyError::malformed("missing signature timestamp"))?;

        if v1_signatures.is_empty() {
            return Err(VerifyError::MissingSignature);
        }

        Ok(Self {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier for Stripe webhooks.
#[derive(Debug, Clone)]
pub struct StripeVerifier {
    secret: Option<SecretMaterial>,
    tolerance: Duration,
    bypass: DevBypass,
}

impl StripeVerifier {
    /// Create a verifier with the default tolerance window.
    #[must_use]
    pub fn new(secret: Option<SecretMaterial>, bypass: DevBypass) -> Self {
        Self {
            secret,
            tolerance: DEFAULT_TOLERANCE,
            bypass,
        }
    }

    /// Override the tolerance window.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// The configured tolerance window.
    #[must_use]
    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Verify the envelope against an explicit clock reading.
    ///
    /// # Verification steps
    ///
    /// 1. Require a configured secret (or the development bypass)
    /// 2. Parse the signature header
    /// 3. Compute `HMAC-SHA256(secret, "{t}." || body)`
    /// 4. Accept if any `v1` matches in constant time
    /// 5. Reject if `t` is outside the tolerance window
    /// 6. Parse the now-trusted body and classify the event
    ///
    /// # Errors
    ///
    /// See [`WebhookVerifier::verify`].
    pub fn verify_at(
        &self,
        envelope: &WebhookEnvelope<'_>,
        now: DateTime<Utc>,
    ) -> Result<VerifiedEvent, VerifyError> {
        let Some(secret) = &self.secret else {
            if self.bypass.is_enabled() {
                return Self::classify(envelope.body, Assurance::DevelopmentBypass);
            }
            return Err(VerifyError::NotConfigured("stripe webhook secret"));
        };

        let header = StripeSignatureHeader::parse(envelope.require_signature()?)?;

        let timestamp = header.timestamp.to_string();
        let expected =
            hmac_sha256_hex_parts(secret.expose(), &[timestamp.as_bytes(), b".", envelope.body]);

        let matched = header
            .v1_signatures
            .iter()
            .any(|sig| constant_time_eq(expected.as_bytes(), sig.as_bytes()));

        if !matched {
            return Err(VerifyError::InvalidSignature);
        }

        self.check_timestamp(header.timestamp, now)?;

        Self::classify(envelope.body, Assurance::Signed)
    }

    /// Reject timestamps further than the tolerance from `now`, either way.
    fn check_timestamp(&self, timestamp: i64, now: DateTime<Utc>) -> Result<(), VerifyError> {
        let age_secs = now.timestamp().saturating_sub(timestamp);
        let tolerance = i64::try_from(self.tolerance.as_secs()).unwrap_or(i64::MAX);

        if age_secs.saturating_abs() > tolerance {
            return Err(VerifyError::StaleDelivery { age_secs });
        }

        Ok(())
    }

    fn classify(body: &[u8], assurance: Assurance) -> Result<VerifiedEvent, VerifyError> {
        VerifiedEvent::from_authentic_body(Provider::Stripe, assurance, body, "type", |event| {
            event
                .get("id")
                .and_then(serde_json::Value::as_str)
                .map(String::from)
        })
    }
}

impl WebhookVerifier for StripeVerifier {
    fn provider(&self) -> Provider {
        Provider::Stripe
    }

    fn signature_header(&self) -> &'static str {
        STRIPE_SIGNATURE_HEADER
    }

    fn verify(&self, envelope: &WebhookEnvelope<'_>) -> Result<VerifiedEvent, VerifyError> {
        self.verify_at(envelope, Utc::now())
    }
}

/// Coarse classification of Stripe event types the service reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEventKind {
    /// `checkout.session.completed`
    CheckoutCompleted,
    /// `checkout.session.expired`
    CheckoutExpired,
    /// `payment_intent.succeeded`
    PaymentSucceeded,
    /// `payment_intent.payment_failed` or `invoice.payment_failed`
    PaymentFailed,
    /// Anything else.
    Other,
}

impl StripeEventKind {
    /// Classify a Stripe event type string.
    #[must_use]
    pub fn classify(event_type: &str) -> Self {
        match event_type {
            "checkout.session.completed" => Self::CheckoutCompleted,
            "checkout.session.expired" => Self::CheckoutExpired,
            "payment_intent.succeeded" => Self::PaymentSucceeded,
            "payment_intent.payment_failed" | "invoice.payment_failed" => Self::PaymentFailed,
            _ => Self::Other,
        }
    }
}

/// Build a `Stripe-Signature` header for `body` at `timestamp`.
///
/// Used by tests and local tooling to produce deliveries the verifier accepts.
#[must_use]
pub fn sign_payload(secret: &SecretMaterial, timestamp: i64, body: &[u8]) -> String {
    let t = timestamp.to_string();
    let sig = hmac_sha256_hex_parts(secret.expose(), &[t.as_bytes(), b".", body]);
    format!("t={t},v1={sig}")
}
