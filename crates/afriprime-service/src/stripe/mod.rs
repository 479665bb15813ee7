//! Stripe integration for hosted checkout.
//!
//! Stripe handles:
//! - One-off payments via Checkout
//! - Payment events, delivered to `/webhooks/stripe` and verified in the core crate

pub mod client;
pub mod types;

pub use client::StripeClient;
pub use client::StripeError;
pub use types::*;
