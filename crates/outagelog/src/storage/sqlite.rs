use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{migrations, KeyValueStore};
use crate::error::{Error, Result};

/// Slot store backed by a `SQLite` database.
///
/// Each slot is one row of the `slots` table. Statements run synchronously
/// on a single connection; every call is one short statement.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// and initializes the schema on a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of slots currently stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn slot_count(&self) -> Result<i64> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM slots", [], |row| row.get(0))?;
        Ok(count)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("sqlite connection lock poisoned"))
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connection()?;
        let value = conn
            .query_row("SELECT value FROM slots WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            r"
            INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        debug!(key, bytes = value.len(), "Slot written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let conn = self.connection()?;
        let affected = conn.execute("DELETE FROM slots WHERE key = ?1", [key])?;
        debug!(key, affected, "Slot removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("failed to create test store")
    }

    #[tokio::test]
    async fn test_get_absent_slot() {
        let store = create_test_store();
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = create_test_store();
        store.set("slot", "[1,2,3]").await.unwrap();
        assert_eq!(store.get("slot").await.unwrap().as_deref(), Some("[1,2,3]"));
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = create_test_store();
        store.set("slot", "first").await.unwrap();
        store.set("slot", "second").await.unwrap();
        assert_eq!(store.get("slot").await.unwrap().as_deref(), Some("second"));
        assert_eq!(store.slot_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = create_test_store();
        store.set("slot", "x").await.unwrap();
        store.remove("slot").await.unwrap();
        assert!(store.get("slot").await.unwrap().is_none());
        // Removing again is fine.
        store.remove("slot").await.unwrap();
    }

    #[tokio::test]
    async fn test_slots_are_independent() {
        let store = create_test_store();
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        store.remove("a").await.unwrap();
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_unicode_value() {
        let store = create_test_store();
        let value = r#"[{"location":"São Paulo — Zona Sul"}]"#;
        store.set("slot", value).await.unwrap();
        assert_eq!(store.get("slot").await.unwrap().as_deref(), Some(value));
    }

    #[test]
    fn test_path() {
        let store = create_test_store();
        assert_eq!(store.path().to_string_lossy(), ":memory:");
    }

    #[tokio::test]
    async fn test_file_based_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("outagelog.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store.set("slot", "persisted").await.unwrap();
            assert_eq!(store.path(), db_path);
        }

        let store = SqliteStore::open(&db_path).unwrap();
        assert_eq!(store.get("slot").await.unwrap().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/outagelog.db");
        let _store = SqliteStore::open(&nested).unwrap();
        assert!(nested.exists());
    }
}
