//! Core types and signature verification for the AfriPrime backend.
//!
//! This crate decides whether data arriving from an untrusted party was really
//! produced by the party it claims to come from:
//!
//! - **Telegram**: Mini App `initData` login payloads ([`InitDataVerifier`])
//! - **Stripe**: `Stripe-Signature` webhooks ([`StripeVerifier`])
//! - **Paystack**: `X-Paystack-Signature` webhooks ([`PaystackVerifier`])
//!
//! Every verifier is a pure function of its inputs and the secret it was
//! built with. Nothing here performs I/O or holds mutable state, so verifiers
//! can be shared across tasks freely.
//!
//! The crate also carries the small domain types the service persists:
//! [`Profile`] records keyed by [`TelegramId`] and [`ProcessedEvent`]
//! idempotency markers.
//!
//! # Failure classes
//!
//! Verification failures are ordinary values of [`VerifyError`]. Callers must
//! keep `MalformedInput`, `InvalidSignature` and `NotConfigured` apart; see
//! [`VerifyError::code`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod crypto;
pub mod error;
pub mod ids;
pub mod init_data;
pub mod paystack;
pub mod profile;
pub mod secret;
pub mod stripe;
pub mod webhook;

pub use error::{VerificationResult, VerifyError};
pub use ids::{IdError, TelegramId};
pub use init_data::{InitDataPairs, InitDataVerifier, TelegramUser, VerifiedInitData};
pub use paystack::{PaystackEventKind, PaystackVerifier, PAYSTACK_SIGNATURE_HEADER};
pub use profile::{Profile, ProfileError, ProfileUpdate};
pub use secret::SecretMaterial;
pub use stripe::{
    StripeEventKind, StripeSignatureHeader, StripeVerifier, DEFAULT_TOLERANCE,
    STRIPE_SIGNATURE_HEADER,
};
pub use webhook::{
    Assurance, DevBypass, ProcessedEvent, Provider, VerifiedEvent, WebhookEnvelope,
    WebhookVerifier,
};
