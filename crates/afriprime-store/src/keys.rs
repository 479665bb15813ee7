//! Key encoding utilities.
//!
//! This module provides functions for encoding keys used in column families
//! and in-memory maps.

use afriprime_core::{Provider, TelegramId};

/// Create a profile key from a Telegram id.
#[must_use]
pub fn profile_key(telegram_id: TelegramId) -> Vec<u8> {
    telegram_id.to_be_bytes().to_vec()
}

/// Create a processed-event key.
///
/// Format: `provider || ':' || event_id`. Provider names contain no `:`, so
/// keys from different providers never collide.
#[must_use]
pub fn processed_event_key(provider: Provider, event_id: &str) -> Vec<u8> {
    let provider = provider.as_str();
    let mut key = Vec::with_capacity(provider.len() + 1 + event_id.len());
    key.extend_from_slice(provider.as_bytes());
    key.push(b':');
    key.extend_from_slice(event_id.as_bytes());
    key
}
