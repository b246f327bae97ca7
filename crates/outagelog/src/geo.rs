//! Geographic points.
//!
//! A [`GeoPoint`] is an ephemeral value: it is never persisted on its own,
//! only used as input and output of distance computation and geocoding.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Accepts `lat,lon` or `lat; lon` with optional sign, decimals and whitespace.
const COORDINATE_PATTERN: &str = r"^\s*([+-]?\d{1,3}(?:\.\d+)?)\s*[,;]\s*([+-]?\d{1,3}(?:\.\d+)?)\s*$";

fn coordinate_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(COORDINATE_PATTERN).expect("coordinate pattern is valid"))
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point without validating it.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a point, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinate`] if the pair is not a usable position.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self> {
        let point = Self::new(latitude, longitude);
        if point.is_valid() {
            Ok(point)
        } else {
            Err(Error::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    /// Whether both components are finite and inside the valid ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to `other` in kilometers.
    ///
    /// See [`crate::distance::compute`].
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        crate::distance::compute(*self, *other)
    }

    /// Parse a `"lat,lon"` pair, returning `None` for anything else.
    #[must_use]
    pub fn parse_pair(input: &str) -> Option<Self> {
        let caps = coordinate_regex().captures(input)?;
        let latitude = caps.get(1)?.as_str().parse().ok()?;
        let longitude = caps.get(2)?.as_str().parse().ok()?;
        Self::try_new(latitude, longitude).ok()
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.latitude, self.longitude)
    }
}

impl FromStr for GeoPoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_pair(s).ok_or_else(|| Error::CoordinateParse {
            input: s.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_point() {
        assert!(GeoPoint::new(-23.5505, -46.6333).is_valid());
        assert!(GeoPoint::new(90.0, 180.0).is_valid());
        assert!(GeoPoint::new(-90.0, -180.0).is_valid());
    }

    #[test]
    fn test_invalid_points() {
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::NAN).is_valid());
        assert!(!GeoPoint::new(f64::INFINITY, 0.0).is_valid());
        assert!(!GeoPoint::new(90.1, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.5).is_valid());
    }

    #[test]
    fn test_try_new_rejects_nan() {
        let err = GeoPoint::try_new(f64::NAN, 10.0).unwrap_err();
        assert!(matches!(err, Error::InvalidCoordinate { .. }));
    }

    #[test]
    fn test_parse_pair() {
        let p = GeoPoint::parse_pair("-23.5505, -46.6333").unwrap();
        assert!((p.latitude - -23.5505).abs() < 1e-12);
        assert!((p.longitude - -46.6333).abs() < 1e-12);

        let p = GeoPoint::parse_pair("  10;20 ").unwrap();
        assert!((p.latitude - 10.0).abs() < 1e-12);
        assert!((p.longitude - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_pair_rejects_text_and_out_of_range() {
        assert!(GeoPoint::parse_pair("Bairro Centro").is_none());
        assert!(GeoPoint::parse_pair("01234-567").is_none());
        assert!(GeoPoint::parse_pair("95.0,10.0").is_none());
        assert!(GeoPoint::parse_pair("").is_none());
    }

    #[test]
    fn test_from_str_error() {
        let err = "nowhere".parse::<GeoPoint>().unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let p = GeoPoint::new(-22.90685, -43.17290);
        let parsed: GeoPoint = p.to_string().parse().unwrap();
        assert!((parsed.latitude - p.latitude).abs() < 1e-9);
        assert!((parsed.longitude - p.longitude).abs() < 1e-9);
    }
}
