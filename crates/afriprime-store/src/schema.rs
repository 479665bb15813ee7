//! Column family definitions.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Profile records, keyed by big-endian `telegram_id`.
    pub const PROFILES: &str = "profiles";

    /// Processed webhook events for idempotency, keyed by `provider:event_id`.
    pub const PROCESSED_EVENTS: &str = "processed_events";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::PROFILES, cf::PROCESSED_EVENTS]
}
