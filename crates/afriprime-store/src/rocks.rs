//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rocksdb::{BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options};

use afriprime_core::{ProcessedEvent, Profile, ProfileUpdate, Provider, TelegramId};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes read-modify-write operations.
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Database("write lock poisoned".into()))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Profile Operations
    // =========================================================================

    fn put_profile(&self, profile: &Profile) -> Result<()> {
        let cf = self.cf(cf::PROFILES)?;
        let key = keys::profile_key(profile.telegram_id);
        let value = Self::serialize(profile)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_profile(&self, telegram_id: TelegramId) -> Result<Option<Profile>> {
        let cf = self.cf(cf::PROFILES)?;
        let key = keys::profile_key(telegram_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn upsert_profile(&self, update: ProfileUpdate) -> Result<Profile> {
        let _guard = self.lock()?;

        let mut profile = self
            .get_profile(update.telegram_id)?
            .unwrap_or_else(|| Profile::new(update.telegram_id));
        profile.apply(update);

        self.put_profile(&profile)?;

        tracing::debug!(telegram_id = %profile.telegram_id, "Profile upserted");

        Ok(profile)
    }

    // =========================================================================
    // Processed Event Operations
    // =========================================================================

    fn has_processed_event(&self, provider: Provider, event_id: &str) -> Result<bool> {
        let cf = self.cf(cf::PROCESSED_EVENTS)?;
        let key = keys::processed_event_key(provider, event_id);

        let exists = self
            .db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();

        Ok(exists)
    }

    fn record_processed_event(&self, event: &ProcessedEvent) -> Result<()> {
        let _guard = self.lock()?;

        // Check for duplicate event
        if self.has_processed_event(event.provider, &event.event_id)? {
            return Err(StoreError::DuplicateEvent {
                event_id: event.event_id.clone(),
            });
        }

        let cf = self.cf(cf::PROCESSED_EVENTS)?;
        let key = keys::processed_event_key(event.provider, &event.event_id);
        let value = Self::serialize(event)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_processed_event(
        &self,
        provider: Provider,
        event_id: &str,
    ) -> Result<Option<ProcessedEvent>> {
        let cf = self.cf(cf::PROCESSED_EVENTS)?;
        let key = keys::processed_event_key(provider, event_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn marker(provider: Provider, event_id: &str) -> ProcessedEvent {
        ProcessedEvent {
            provider,
            event_id: event_id.to_string(),
            event_type: "charge.success".to_string(),
            received_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn profile_crud() {
        let (store, _dir) = create_test_store();
        let telegram_id = TelegramId::new(42);

        assert!(store.get_profile(telegram_id).unwrap().is_none());

        let mut profile = Profile::new(telegram_id);
        profile.display_name = Some("Ada".into());
        store.put_profile(&profile).unwrap();

        let retrieved = store.get_profile(telegram_id).unwrap().unwrap();
        assert_eq!(retrieved, profile);
    }

    #[test]
    fn upsert_creates_then_replaces() {
        let (store, _dir) = create_test_store();
        let telegram_id = TelegramId::new(7);

        let created = store
            .upsert_profile(ProfileUpdate {
                telegram_id,
                display_name: Some("Ada".into()),
                age: Some(30),
                location: Some("Lagos".into()),
            })
            .unwrap();

        let updated = store
            .upsert_profile(ProfileUpdate {
                telegram_id,
                display_name: Some("Ada L.".into()),
                age: None,
                location: None,
            })
            .unwrap();

        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.display_name.as_deref(), Some("Ada L."));
        assert!(updated.age.is_none());

        let stored = store.get_profile(telegram_id).unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[test]
    fn processed_event_idempotency() {
        let (store, _dir) = create_test_store();
        let event = marker(Provider::Paystack, "ref_123");

        assert!(!store.has_processed_event(Provider::Paystack, "ref_123").unwrap());

        // First record succeeds
        store.record_processed_event(&event).unwrap();
        assert!(store.has_processed_event(Provider::Paystack, "ref_123").unwrap());

        // Second record fails with duplicate error
        let result = store.record_processed_event(&event);
        assert!(matches!(result, Err(StoreError::DuplicateEvent { .. })));

        let stored = store
            .get_processed_event(Provider::Paystack, "ref_123")
            .unwrap()
            .unwrap();
        assert_eq!(stored, event);
    }

    #[test]
    fn processed_events_are_provider_scoped() {
        let (store, _dir) = create_test_store();

        store
            .record_processed_event(&marker(Provider::Stripe, "same_id"))
            .unwrap();

        assert!(!store.has_processed_event(Provider::Paystack, "same_id").unwrap());
        store
            .record_processed_event(&marker(Provider::Paystack, "same_id"))
            .unwrap();
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let telegram_id = TelegramId::new(99);

        {
            let store = RocksStore::open(dir.path()).unwrap();
            store.put_profile(&Profile::new(telegram_id)).unwrap();
            store
                .record_processed_event(&marker(Provider::Stripe, "evt_1"))
                .unwrap();
        }

        let store = RocksStore::open(dir.path()).unwrap();
        assert!(store.get_profile(telegram_id).unwrap().is_some());
        assert!(store.has_processed_event(Provider::Stripe, "evt_1").unwrap());
    }
}
