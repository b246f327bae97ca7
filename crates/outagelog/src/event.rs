//! Outage event types.
//!
//! This module defines the persisted [`OutageEvent`] record, its identifier,
//! and [`EventDraft`], the validated input collected while recording a new
//! event.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geo::GeoPoint;
use crate::geocode::Geocoder;

/// Last id handed out by [`EventId::generate`] in this process.
static LAST_GENERATED: AtomicI64 = AtomicI64::new(0);

/// Opaque unique identifier of an outage event.
///
/// Generated ids are the creation time in Unix milliseconds. Ids read back
/// from storage are kept verbatim, whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id from the current time.
    ///
    /// Strictly increasing within a process: two calls in the same
    /// millisecond still produce different ids.
    #[must_use]
    pub fn generate() -> Self {
        let now = Utc::now().timestamp_millis();
        let mut last = LAST_GENERATED.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(last.saturating_add(1));
            match LAST_GENERATED.compare_exchange(
                last,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Self(candidate.to_string()),
                Err(actual) => last = actual,
            }
        }
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A recorded power outage.
///
/// Immutable once created. Latitude and longitude are NaN when the location
/// could not be geocoded; use [`OutageEvent::coordinates`] rather than
/// reading them directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutageEvent {
    /// Unique identifier.
    pub id: EventId,

    /// Free-text place description (neighbourhood, city, postal code).
    pub location: String,

    /// Free-text duration description, e.g. "3 hours".
    pub outage_duration: String,

    /// Free-text description of the resulting damage.
    pub damages: String,

    /// When the event was recorded, as ISO-8601 text.
    ///
    /// Kept exactly as stored so documents written elsewhere survive a
    /// rewrite unchanged. See [`OutageEvent::recorded_time`].
    pub recorded_at: String,

    /// Latitude in degrees, NaN if unknown.
    #[serde(with = "coordinate", default = "coordinate::unknown")]
    pub latitude: f64,

    /// Longitude in degrees, NaN if unknown.
    #[serde(with = "coordinate", default = "coordinate::unknown")]
    pub longitude: f64,
}

impl OutageEvent {
    /// Build an event from its parts.
    ///
    /// `coordinates` of `None` stores NaN for both components.
    #[must_use]
    pub fn new(
        id: EventId,
        location: impl Into<String>,
        outage_duration: impl Into<String>,
        damages: impl Into<String>,
        recorded_at: impl Into<String>,
        coordinates: Option<GeoPoint>,
    ) -> Self {
        let (latitude, longitude) =
            coordinates.map_or((f64::NAN, f64::NAN), |p| (p.latitude, p.longitude));
        Self {
            id,
            location: location.into(),
            outage_duration: outage_duration.into(),
            damages: damages.into(),
            recorded_at: recorded_at.into(),
            latitude,
            longitude,
        }
    }

    /// Stored coordinates, if both are present and valid.
    #[must_use]
    pub fn coordinates(&self) -> Option<GeoPoint> {
        let point = GeoPoint::new(self.latitude, self.longitude);
        point.is_valid().then_some(point)
    }

    /// Whether this event has usable coordinates.
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.coordinates().is_some()
    }

    /// The recording time, if the stored text is RFC 3339.
    #[must_use]
    pub fn recorded_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.recorded_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Copy of this event with the given coordinates.
    ///
    /// Used for in-memory corrections; never persisted by the store.
    #[must_use]
    pub fn with_coordinates(&self, point: GeoPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
            ..self.clone()
        }
    }
}

/// JSON representation of a coordinate: a number, or `null` when unknown.
mod coordinate {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn unknown() -> f64 {
        f64::NAN
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

/// Input collected while recording a new outage.
///
/// Mirrors the recording workflow: a location (geocoded to coordinates),
/// how long the power was out, and what it damaged. All three texts are
/// required.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    location: String,
    outage_duration: String,
    damages: String,
    coordinates: Option<GeoPoint>,
}

impl EventDraft {
    /// Validate the free-text fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyField`] for the first field that is blank.
    pub fn new(
        location: impl Into<String>,
        outage_duration: impl Into<String>,
        damages: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            location: required("location", location.into())?,
            outage_duration: required("outage duration", outage_duration.into())?,
            damages: required("damages", damages.into())?,
            coordinates: None,
        })
    }

    /// Use known coordinates instead of geocoding the location.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinate`] if `point` is not a valid position.
    pub fn with_coordinates(mut self, point: GeoPoint) -> Result<Self> {
        self.coordinates = Some(GeoPoint::try_new(point.latitude, point.longitude)?);
        Ok(self)
    }

    /// Resolve the location text to coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GeocodeNotFound`] when the geocoder has no candidate,
    /// so the caller can ask the user to correct the address, or the
    /// geocoder's own error if the lookup failed.
    pub async fn locate(mut self, geocoder: &dyn Geocoder) -> Result<Self> {
        match geocoder.geocode(&self.location).await? {
            Some(point) => {
                debug!(location = %self.location, %point, "Location geocoded");
                self.coordinates = Some(point);
                Ok(self)
            }
            None => Err(Error::GeocodeNotFound {
                address: self.location,
            }),
        }
    }

    /// The location text.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Coordinates resolved so far.
    #[must_use]
    pub fn coordinates(&self) -> Option<GeoPoint> {
        self.coordinates
    }

    /// Stamp an id and creation time, producing the event to store.
    ///
    /// The time is UTC with millisecond precision, e.g.
    /// `2024-06-20T16:13:20.123Z`.
    #[must_use]
    pub fn into_event(self) -> OutageEvent {
        OutageEvent::new(
            EventId::generate(),
            self.location,
            self.outage_duration,
            self.damages,
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            self.coordinates,
        )
    }
}

fn required(field: &'static str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyField { field });
    }
    Ok(trimmed.to_string())
}
