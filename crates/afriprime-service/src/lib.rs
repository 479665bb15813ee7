//! AfriPrime HTTP API Service.
//!
//! This crate provides the HTTP API behind the AfriPrime Telegram Mini App:
//!
//! - Telegram `initData` validation
//! - User profiles
//! - Stripe Checkout session creation
//! - Stripe and Paystack webhooks
//!
//! # Authentication
//!
//! Every inbound payload that claims to come from somewhere is checked with
//! the verifiers in `afriprime-core`:
//!
//! 1. **Telegram `initData`** - HMAC-SHA256 chain keyed by the bot token
//! 2. **Stripe webhooks** - timestamped HMAC-SHA256 in `Stripe-Signature`
//! 3. **Paystack webhooks** - HMAC-SHA512 in `X-Paystack-Signature`
//!
//! A verifier without its secret refuses everything unless the development
//! bypass (`AFRIPRIME_DEV_BYPASS`) is on.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for the Axum signature

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod stripe;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, EventLocks};
pub use stripe::{StripeClient, StripeError};
