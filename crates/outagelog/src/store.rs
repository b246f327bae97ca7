//! Durable collection of outage events.
//!
//! The whole collection lives in one slot of a [`KeyValueStore`] as a JSON
//! array. Every mutation reads the full document, changes it and writes it
//! back. Mutations are serialized by a single-writer lock so two
//! overlapping calls cannot lose each other's update.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::event::{EventId, OutageEvent};
use crate::storage::{open_store, KeyValueStore};

/// CRUD over the stored list of [`OutageEvent`]s.
///
/// There is no index: lookups and removals scan the list. Expected sizes
/// are a handful to a few hundred events.
#[derive(Debug)]
pub struct EventStore {
    backend: Arc<dyn KeyValueStore>,
    slot: String,
    write_lock: Mutex<()>,
}

impl EventStore {
    /// Store events in `slot` of `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>, slot: impl Into<String>) -> Self {
        Self {
            backend,
            slot: slot.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Open the configured backend and slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be opened.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(open_store(config)?, config.storage.slot_key.clone()))
    }

    /// Key of the slot holding the events.
    #[must_use]
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// All stored events, in insertion order.
    ///
    /// Never fails: an unreadable or corrupt slot is logged and reported as
    /// an empty list, so a view always has something to show. Use
    /// [`EventStore::try_load`] to see the error.
    pub async fn load(&self) -> Vec<OutageEvent> {
        match self.read_document().await {
            Ok(events) => events,
            Err(e) => {
                error!(slot = %self.slot, error = %e, "Failed to load events; returning empty list");
                Vec::new()
            }
        }
    }

    /// All stored events, or the reason they could not be read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageRead`] if the backend fails, or
    /// [`Error::CorruptDocument`] if the slot does not hold an event list.
    pub async fn try_load(&self) -> Result<Vec<OutageEvent>> {
        self.read_document().await
    }

    /// Find one event by id.
    pub async fn get(&self, id: &EventId) -> Option<OutageEvent> {
        self.load().await.into_iter().find(|e| &e.id == id)
    }

    /// Append an event to the collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateEvent`] if the id is already stored, a read
    /// error if the current document cannot be read (it is left untouched),
    /// or [`Error::StorageWrite`] if the new document could not be saved.
    pub async fn add(&self, event: OutageEvent) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut events = self.read_document().await?;
        if events.iter().any(|e| e.id == event.id) {
            return Err(Error::DuplicateEvent {
                id: event.id.to_string(),
            });
        }

        let id = event.id.clone();
        events.push(event);
        self.write_document(&events).await?;
        info!(%id, total = events.len(), "Event recorded");
        Ok(())
    }

    /// Remove every event with the given id.
    ///
    /// Returns how many events were removed. Removing an id that is not
    /// stored is a no-op and does not touch the slot.
    ///
    /// # Errors
    ///
    /// Returns a read error if the current document cannot be read, or
    /// [`Error::StorageWrite`] if the filtered document could not be saved.
    pub async fn remove(&self, id: &EventId) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let mut events = self.read_document().await?;
        let before = events.len();
        events.retain(|e| &e.id != id);
        let removed = before - events.len();

        if removed == 0 {
            debug!(%id, "Nothing to remove");
            return Ok(0);
        }

        self.write_document(&events).await?;
        info!(%id, removed, "Event removed");
        Ok(removed)
    }

    /// Delete the whole collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`] if the slot could not be deleted.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        self.backend
            .remove(&self.slot)
            .await
            .map_err(|e| Error::storage_write(&self.slot, e))?;
        info!(slot = %self.slot, "All events cleared");
        Ok(())
    }

    async fn read_document(&self) -> Result<Vec<OutageEvent>> {
        let raw = self
            .backend
            .get(&self.slot)
            .await
            .map_err(|e| Error::storage_read(&self.slot, e))?;

        let Some(raw) = raw else {
            return Ok(Vec::new());
        };

        // `null` is what an empty JSON document decays to in some writers.
        let events: Option<Vec<OutageEvent>> =
            serde_json::from_str(&raw).map_err(|source| Error::CorruptDocument {
                slot: self.slot.clone(),
                source,
            })?;
        Ok(events.unwrap_or_default())
    }

    async fn write_document(&self, events: &[OutageEvent]) -> Result<()> {
        let raw = serde_json::to_string(events)?;
        self.backend
            .set(&self.slot, &raw)
            .await
            .map_err(|e| Error::storage_write(&self.slot, e))
    }
}
