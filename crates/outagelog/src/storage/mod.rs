//! Key-value storage backends.
//!
//! Events are persisted as one serialized document in a named slot of a
//! local key-value store. This module defines the slot abstraction,
//! [`KeyValueStore`], and its backends:
//!
//! - [`SqliteStore`]: a `SQLite` table of slots (the default)
//! - [`FileStore`]: one file per slot in a directory
//! - [`MemoryStore`]: ephemeral, with fault injection for tests

mod file;
mod memory;
pub mod migrations;
pub mod schema;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{Config, StorageBackend};
use crate::error::Result;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A local persistent store of named string slots.
///
/// Each call is a short unit of work that may suspend on I/O. The store
/// itself offers no read-modify-write atomicity; that is the job of the
/// caller (see [`crate::store::EventStore`]).
#[async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Name of this backend (for logging).
    fn name(&self) -> &'static str;

    /// Read a slot. An absent slot is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the contents of a slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a slot. Deleting an absent slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Open the backend selected in the configuration.
///
/// # Errors
///
/// Returns an error if the backend cannot be opened (for example the
/// database file cannot be created).
pub fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match config.storage.backend {
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(config.database_path())?),
        StorageBackend::File => Arc::new(FileStore::new(config.slot_directory())),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    info!(backend = store.name(), "Storage backend ready");
    Ok(store)
}
