//! Database schema versioning.
//!
//! This versions the `SQLite` container (tables and columns), not the event
//! document stored inside a slot. A database stamped by a newer build is
//! refused rather than silently misread.

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// The current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Create missing tables and stamp or check the schema version.
///
/// # Errors
///
/// Returns an error if table creation fails, the stored version cannot be
/// parsed, or the database was written by a newer schema.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    match schema_version(conn)? {
        0 => {
            debug!(version = CURRENT_VERSION, "Stamping fresh database");
            set_schema_version(conn, CURRENT_VERSION)
        }
        v if v > CURRENT_VERSION => Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {v} is newer than supported version {CURRENT_VERSION}"
            ),
        }),
        _ => Ok(()),
    }
}

/// Stored schema version, 0 for a fresh database.
fn schema_version(conn: &Connection) -> Result<i32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(0),
        Some(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}
