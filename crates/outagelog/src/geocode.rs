//! Geocoding: turning free-text addresses into coordinates.
//!
//! The [`Geocoder`] trait is the seam to whatever service resolves
//! addresses. A geocoder answers with zero or one candidate; "nothing found"
//! is `Ok(None)`, not an error. Offline implementations are provided for the
//! command-line tool and for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::GeocodingConfig;
use crate::error::Result;
use crate::geo::GeoPoint;

/// Resolves an address to at most one coordinate pair.
#[async_trait]
pub trait Geocoder: Send + Sync + std::fmt::Debug {
    /// Name of this geocoder (for logging).
    fn name(&self) -> &'static str;

    /// Look up `address`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the lookup itself failed. An address with
    /// no match yields `Ok(None)`.
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>>;
}

/// Accepts addresses that already are a `"lat, lon"` pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateGeocoder;

#[async_trait]
impl Geocoder for CoordinateGeocoder {
    fn name(&self) -> &'static str {
        "coordinates"
    }

    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>> {
        Ok(GeoPoint::parse_pair(address))
    }
}

/// Offline table of known place names.
///
/// Names match case-insensitively with runs of whitespace collapsed.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    places: HashMap<String, GeoPoint>,
}

impl Gazetteer {
    /// Build a gazetteer from `(name, point)` pairs.
    ///
    /// Entries with invalid coordinates are skipped with a warning; later
    /// duplicates replace earlier ones.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, GeoPoint)>,
        S: AsRef<str>,
    {
        let mut places = HashMap::new();
        for (name, point) in entries {
            let name = name.as_ref();
            if !point.is_valid() {
                warn!(place = %name, "Skipping gazetteer entry with invalid coordinates");
                continue;
            }
            places.insert(normalize(name), point);
        }
        Self { places }
    }

    /// Number of known places.
    #[must_use]
    pub fn len(&self) -> usize {
        self.places.len()
    }

    /// Whether the gazetteer knows no places.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

#[async_trait]
impl Geocoder for Gazetteer {
    fn name(&self) -> &'static str {
        "gazetteer"
    }

    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>> {
        Ok(self.places.get(&normalize(address)).copied())
    }
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Tries several geocoders in order; the first candidate wins.
///
/// A geocoder that fails is logged and skipped, so one broken source does
/// not hide answers from the others.
#[derive(Debug, Default)]
pub struct GeocoderChain {
    geocoders: Vec<Box<dyn Geocoder>>,
}

impl GeocoderChain {
    /// Create an empty chain (which never finds anything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a geocoder to the chain.
    #[must_use]
    pub fn with(mut self, geocoder: impl Geocoder + 'static) -> Self {
        self.geocoders.push(Box::new(geocoder));
        self
    }

    /// Build the chain described by the configuration.
    #[must_use]
    pub fn from_config(config: &GeocodingConfig) -> Self {
        let mut chain = Self::new();
        if config.accept_coordinates {
            chain = chain.with(CoordinateGeocoder);
        }
        let gazetteer = Gazetteer::from_entries(
            config
                .places
                .iter()
                .map(|p| (p.name.as_str(), GeoPoint::new(p.latitude, p.longitude))),
        );
        if !gazetteer.is_empty() {
            chain = chain.with(gazetteer);
        }
        chain
    }

    /// Number of geocoders in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.geocoders.len()
    }

    /// Whether the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geocoders.is_empty()
    }
}

#[async_trait]
impl Geocoder for GeocoderChain {
    fn name(&self) -> &'static str {
        "chain"
    }

    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>> {
        for geocoder in &self.geocoders {
            match geocoder.geocode(address).await {
                Ok(Some(point)) => {
                    debug!(geocoder = geocoder.name(), %address, %point, "Address resolved");
                    return Ok(Some(point));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(geocoder = geocoder.name(), %address, error = %e, "Geocoder failed");
                }
            }
        }
        Ok(None)
    }
}
