//! API handlers.

pub mod checkout;
pub mod health;
pub mod profile;
pub mod telegram;
pub mod webhooks;
