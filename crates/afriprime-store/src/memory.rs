//! In-memory storage implementation.
//!
//! Holds everything in process memory behind a lock. Nothing survives a
//! restart, so this backend is for tests and local development only.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use afriprime_core::{ProcessedEvent, Profile, ProfileUpdate, Provider, TelegramId};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::Store;

#[derive(Default)]
struct Tables {
    profiles: HashMap<TelegramId, Profile>,
    processed_events: HashMap<Vec<u8>, ProcessedEvent>,
}

/// Memory-backed storage implementation.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }
}

impl Store for MemoryStore {
    fn put_profile(&self, profile: &Profile) -> Result<()> {
        self.write()?
            .profiles
            .insert(profile.telegram_id, profile.clone());
        Ok(())
    }

    fn get_profile(&self, telegram_id: TelegramId) -> Result<Option<Profile>> {
        Ok(self.read()?.profiles.get(&telegram_id).cloned())
    }

    fn upsert_profile(&self, update: ProfileUpdate) -> Result<Profile> {
        let mut tables = self.write()?;
        let profile = tables
            .profiles
            .entry(update.telegram_id)
            .or_insert_with(|| Profile::new(update.telegram_id));
        profile.apply(update);
        Ok(profile.clone())
    }

    fn has_processed_event(&self, provider: Provider, event_id: &str) -> Result<bool> {
        let key = keys::processed_event_key(provider, event_id);
        Ok(self.read()?.processed_events.contains_key(&key))
    }

    fn record_processed_event(&self, event: &ProcessedEvent) -> Result<()> {
        let key = keys::processed_event_key(event.provider, &event.event_id);
        let mut tables = self.write()?;

        if tables.processed_events.contains_key(&key) {
            return Err(StoreError::DuplicateEvent {
                event_id: event.event_id.clone(),
            });
        }

        tables.processed_events.insert(key, event.clone());
        Ok(())
    }

    fn get_processed_event(
        &self,
        provider: Provider,
        event_id: &str,
    ) -> Result<Option<ProcessedEvent>> {
        let key = keys::processed_event_key(provider, event_id);
        Ok(self.read()?.processed_events.get(&key).cloned())
    }
}
