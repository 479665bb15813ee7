//! Storage layer for the AfriPrime backend.
//!
//! This crate is the persistence collaborator behind the HTTP service. It
//! stores user profiles and remembers which verified webhook events have
//! already been processed, so redelivered events have no second effect.
//!
//! # Backends
//!
//! - [`RocksStore`] (feature `rocksdb-backend`, on by default): durable,
//!   column families `profiles` and `processed_events`, CBOR values.
//! - [`MemoryStore`]: process memory only. Everything is lost on restart, so
//!   it is meant for tests and local development.
//!
//! # Example
//!
#![cfg_attr(feature = "rocksdb-backend", doc = "```no_run")]
#![cfg_attr(not(feature = "rocksdb-backend"), doc = "```ignore")]
//! use afriprime_core::{ProfileUpdate, TelegramId};
//! use afriprime_store::{RocksStore, Store};
//!
//! let store = RocksStore::open("/tmp/afriprime-db").unwrap();
//!
//! let profile = store
//!     .upsert_profile(ProfileUpdate {
//!         telegram_id: TelegramId::new(42),
//!         display_name: Some("Ada".into()),
//!         age: None,
//!         location: None,
//!     })
//!     .unwrap();
//!
//! let retrieved = store.get_profile(profile.telegram_id).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use afriprime_core::{ProcessedEvent, Profile, ProfileUpdate, Provider, TelegramId};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Profile Operations
    // =========================================================================

    /// Insert or replace a profile record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_profile(&self, profile: &Profile) -> Result<()>;

    /// Get a profile by Telegram id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_profile(&self, telegram_id: TelegramId) -> Result<Option<Profile>>;

    /// Create or update a profile from an update request.
    ///
    /// Every editable field is replaced; `created_at` of an existing record is
    /// kept. Returns the stored profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn upsert_profile(&self, update: ProfileUpdate) -> Result<Profile>;

    // =========================================================================
    // Processed Event Operations (for idempotency)
    // =========================================================================

    /// Check if a webhook event has already been processed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn has_processed_event(&self, provider: Provider, event_id: &str) -> Result<bool>;

    /// Record a webhook event as processed.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateEvent` if the event was already recorded.
    /// - An error if the database operation fails.
    fn record_processed_event(&self, event: &ProcessedEvent) -> Result<()>;

    /// Get the marker for a processed event.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_processed_event(
        &self,
        provider: Provider,
        event_id: &str,
    ) -> Result<Option<ProcessedEvent>>;
}
