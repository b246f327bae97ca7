use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::KeyValueStore;
use crate::error::{Error, Result};

/// Ephemeral slot store.
///
/// Every call yields to the scheduler once before touching the map, the way
/// a real I/O backend suspends. Reads and writes can be made to fail on
/// demand to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent read fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw contents of a slot, bypassing fault injection.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.slots
            .lock()
            .ok()
            .and_then(|slots| slots.get(key).cloned())
    }

    /// Overwrite a slot with raw contents, bypassing fault injection.
    pub fn insert_raw(&self, key: &str, value: &str) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(key.to_string(), value.to_string());
        }
    }

    fn slots(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.slots
            .lock()
            .map_err(|_| Error::internal("memory store lock poisoned"))
    }

    fn check(&self, flag: &AtomicBool, operation: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(Error::BackendUnavailable {
                backend: "memory",
                message: format!("{operation} disabled"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        tokio::task::yield_now().await;
        self.check(&self.fail_reads, "reads")?;
        Ok(self.slots()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        tokio::task::yield_now().await;
        self.check(&self.fail_writes, "writes")?;
        self.slots()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        tokio::task::yield_now().await;
        self.check(&self.fail_writes, "writes")?;
        self.slots()?.remove(key);
        Ok(())
    }
}
