//! Configuration management for outagelog.
//!
//! Configuration is layered with figment: built-in defaults, then an
//! optional TOML file, then environment variables.

use std::path::PathBuf;
use std::sync::OnceLock;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::GeoPoint;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "outagelog";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "outagelog.db";

/// Default directory for the file backend, inside the data directory.
const SLOT_DIR_NAME: &str = "slots";

/// Prefix of environment variable overrides.
const ENV_PREFIX: &str = "OUTAGELOG_";

/// Largest accepted number of decimals for distances.
const MAX_DISTANCE_PRECISION: usize = 6;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `OUTAGELOG_`, sections split by `__`,
///    e.g. `OUTAGELOG_STORAGE__SLOT_KEY`)
/// 2. TOML config file at `~/.config/outagelog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where events are persisted.
    pub storage: StorageConfig,
    /// How distances and events are rendered.
    pub display: DisplayConfig,
    /// Address lookup.
    pub geocoding: GeocodingConfig,
    /// The user's own position, if known.
    pub position: PositionConfig,
}

/// Which [`crate::storage::KeyValueStore`] holds the events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// A `SQLite` database file.
    #[default]
    Sqlite,
    /// One JSON file per slot.
    File,
    /// Nothing survives the process.
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Sqlite => "sqlite",
            Self::File => "file",
            Self::Memory => "memory",
        };
        f.write_str(name)
    }
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend to use.
    pub backend: StorageBackend,
    /// Path to the database file.
    /// Defaults to `~/.local/share/outagelog/outagelog.db`
    pub database_path: Option<PathBuf>,
    /// Directory of the file backend.
    /// Defaults to `~/.local/share/outagelog/slots`
    pub directory: Option<PathBuf>,
    /// Name of the slot holding the event list.
    pub slot_key: String,
}

/// Display-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Decimals shown for distances in kilometers.
    pub distance_precision: usize,
    /// Text shown when a distance cannot be computed.
    pub unknown_distance: String,
    /// Maximum characters of a location label before it is elided.
    pub label_width: usize,
    /// Maximum characters of the damages summary in list views.
    pub summary_width: usize,
}

/// A named place known to the built-in gazetteer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceConfig {
    /// Address or place name, matched case-insensitively.
    pub name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl PlaceConfig {
    /// Coordinates of the place, if valid.
    #[must_use]
    pub fn point(&self) -> Option<GeoPoint> {
        GeoPoint::try_new(self.latitude, self.longitude).ok()
    }
}

/// Geocoding-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Places resolvable by name.
    pub places: Vec<PlaceConfig>,
    /// Accept addresses written as `latitude,longitude`.
    pub accept_coordinates: bool,
}

/// The user's fixed position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionConfig {
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
}

impl PositionConfig {
    /// The configured position, if both halves are set and valid.
    #[must_use]
    pub fn point(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => GeoPoint::try_new(latitude, longitude).ok(),
            _ => None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_path: None, // Will be resolved to default at runtime
            directory: None,
            slot_key: "outage_events".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            distance_precision: 1,
            unknown_distance: "— km".to_string(),
            label_width: 20,
            summary_width: 50,
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            places: Vec::new(),
            accept_coordinates: true,
        }
    }
}

fn slot_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.@-]+$").expect("slot key pattern is valid"))
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `OUTAGELOG_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text, layered over the defaults.
    ///
    /// Environment variables are not consulted.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse or fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(text))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let key = &self.storage.slot_key;
        if key.is_empty() {
            return Err(invalid("storage.slot_key must not be empty"));
        }
        if !slot_key_pattern().is_match(key) || key.starts_with('.') {
            return Err(invalid(format!(
                "storage.slot_key '{key}' may only contain letters, digits and _ . @ -"
            )));
        }

        if self.display.label_width == 0 {
            return Err(invalid("display.label_width must be greater than 0"));
        }
        if self.display.summary_width == 0 {
            return Err(invalid("display.summary_width must be greater than 0"));
        }
        if self.display.distance_precision > MAX_DISTANCE_PRECISION {
            return Err(invalid(format!(
                "display.distance_precision ({}) cannot be greater than {MAX_DISTANCE_PRECISION}",
                self.display.distance_precision
            )));
        }

        for place in &self.geocoding.places {
            if place.name.trim().is_empty() {
                return Err(invalid("geocoding.places entries need a name"));
            }
            if place.point().is_none() {
                return Err(invalid(format!(
                    "geocoding place '{}' has invalid coordinates ({}, {})",
                    place.name, place.latitude, place.longitude
                )));
            }
        }

        match (self.position.latitude, self.position.longitude) {
            (None, None) => {}
            (Some(latitude), Some(longitude)) => {
                GeoPoint::try_new(latitude, longitude)?;
            }
            _ => {
                return Err(invalid(
                    "position.latitude and position.longitude must be set together",
                ));
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the file backend directory, resolving defaults if not set.
    #[must_use]
    pub fn slot_directory(&self) -> PathBuf {
        self.storage
            .directory
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(SLOT_DIR_NAME))
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}
