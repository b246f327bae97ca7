//! Error types for outagelog.
//!
//! This module defines all error types used throughout the outagelog crate.
//! Storage failures carry the slot they happened on; geocoding and position
//! failures are kept separate so the presentation layer can degrade to
//! "distance unknown" instead of aborting.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for outagelog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// The slot could not be read from the backend.
    #[error("failed to read slot '{slot}': {source}")]
    StorageRead {
        /// Key of the slot being read.
        slot: String,
        /// The backend error.
        #[source]
        source: Box<Error>,
    },

    /// The slot could not be written to the backend.
    #[error("failed to write slot '{slot}': {source}")]
    StorageWrite {
        /// Key of the slot being written.
        slot: String,
        /// The backend error.
        #[source]
        source: Box<Error>,
    },

    /// The slot holds something that is not an event list.
    #[error("slot '{slot}' holds a corrupt event document: {source}")]
    CorruptDocument {
        /// Key of the corrupt slot.
        slot: String,
        /// The decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// A backend refused the operation (used by fault-injecting stores).
    #[error("storage backend '{backend}' unavailable: {message}")]
    BackendUnavailable {
        /// Name of the backend.
        backend: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Event Errors ===
    /// A required free-text field was left blank.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Name of the blank field.
        field: &'static str,
    },

    /// An event with the same id is already stored.
    #[error("an event with id {id} already exists")]
    DuplicateEvent {
        /// The conflicting id.
        id: String,
    },

    // === Geographic Errors ===
    /// The geocoder returned no candidate for the address.
    #[error("no coordinates found for address '{address}'")]
    GeocodeNotFound {
        /// The address that was looked up.
        address: String,
    },

    /// The geocoding service itself failed.
    #[error("geocoding failed: {0}")]
    Geocode(String),

    /// A latitude/longitude pair is missing, not finite or out of range.
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate {
        /// The rejected latitude.
        latitude: f64,
        /// The rejected longitude.
        longitude: f64,
    },

    /// Text could not be parsed as a `lat,lon` pair.
    #[error("cannot parse '{input}' as 'latitude,longitude'")]
    CoordinateParse {
        /// The rejected input.
        input: String,
    },

    // === Position Errors ===
    /// Permission to read the current position was not granted.
    #[error("location permission denied")]
    PermissionDenied,

    /// The current position could not be determined.
    #[error("current position unavailable: {0}")]
    PositionUnavailable(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for outagelog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Wrap a backend error as a read failure on `slot`.
    #[must_use]
    pub fn storage_read(slot: impl Into<String>, source: Self) -> Self {
        Self::StorageRead {
            slot: slot.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a backend error as a write failure on `slot`.
    #[must_use]
    pub fn storage_write(slot: impl Into<String>, source: Self) -> Self {
        Self::StorageWrite {
            slot: slot.into(),
            source: Box::new(source),
        }
    }

    /// Create a new geocoding service error.
    #[must_use]
    pub fn geocode(message: impl Into<String>) -> Self {
        Self::Geocode(message.into())
    }

    /// Create a new position-unavailable error.
    #[must_use]
    pub fn position_unavailable(message: impl Into<String>) -> Self {
        Self::PositionUnavailable(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means the geocoder found nothing for an address.
    ///
    /// This is a user input problem, not a system fault.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::GeocodeNotFound { .. })
    }

    /// Check if this error came from reading or writing a storage slot.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::StorageRead { .. }
                | Self::StorageWrite { .. }
                | Self::CorruptDocument { .. }
                | Self::BackendUnavailable { .. }
                | Self::DatabaseOpen { .. }
                | Self::DatabaseQuery(_)
        )
    }

    /// Check if this error is a permission issue.
    #[must_use]
    pub fn is_permission_error(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PermissionDenied;
        assert_eq!(err.to_string(), "location permission denied");

        let err = Error::geocode("service offline");
        assert_eq!(err.to_string(), "geocoding failed: service offline");
    }

    #[test]
    fn test_storage_write_wraps_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only fs");
        let err = Error::storage_write("outage_events", io_err.into());
        let msg = err.to_string();
        assert!(msg.contains("outage_events"));
        assert!(msg.contains("read-only fs"));
        assert!(err.is_storage_error());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_storage_read_wraps_source() {
        let err = Error::storage_read("slot", Error::internal("boom"));
        assert!(err.to_string().contains("failed to read slot 'slot'"));
        assert!(err.is_storage_error());
    }

    #[test]
    fn test_is_not_found() {
        let err = Error::GeocodeNotFound {
            address: "Atlantis".to_string(),
        };
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Atlantis"));
        assert!(!Error::geocode("x").is_not_found());
    }

    #[test]
    fn test_is_permission_error() {
        assert!(Error::PermissionDenied.is_permission_error());
        assert!(!Error::position_unavailable("no fix").is_permission_error());
    }

    #[test]
    fn test_empty_field_display() {
        let err = Error::EmptyField { field: "damages" };
        assert_eq!(err.to_string(), "damages must not be empty");
    }

    #[test]
    fn test_invalid_coordinate_display() {
        let err = Error::InvalidCoordinate {
            latitude: 91.0,
            longitude: 0.0,
        };
        assert!(err.to_string().contains("91"));
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
        assert!(!err.is_storage_error());
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
            assert!(err.is_storage_error());
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_corrupt_document_display() {
        let source = serde_json::from_str::<Vec<i32>>("{").unwrap_err();
        let err = Error::CorruptDocument {
            slot: "outage_events".to_string(),
            source,
        };
        assert!(err.to_string().contains("corrupt"));
        assert!(err.is_storage_error());
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "slot_key must not be empty".to_string(),
        };
        assert!(err.to_string().contains("slot_key"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
