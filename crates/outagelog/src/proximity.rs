//! Events as seen from where the user stands.
//!
//! Places events for display, geocoding those without coordinates,
//! measures their distance from the user and orders them nearest first.
//! Nothing here writes back to storage.

use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::distance::Distance;
use crate::event::OutageEvent;
use crate::geo::GeoPoint;
use crate::geocode::Geocoder;

/// Ellipsis appended to truncated labels.
const ELLIPSIS: char = '…';

/// An event placed on the map, with its distance from the user.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyEvent {
    /// The event exactly as stored.
    pub event: OutageEvent,
    /// Where the event is placed: its stored coordinates, or the
    /// location text geocoded for display.
    pub position: Option<GeoPoint>,
    /// How far it is from the user.
    pub distance: Distance,
}

impl NearbyEvent {
    /// Place an event at its stored coordinates, distance not yet known.
    #[must_use]
    pub fn new(event: OutageEvent) -> Self {
        let position = event.coordinates();
        Self {
            event,
            position,
            distance: Distance::Unknown,
        }
    }

    /// The position, when it was geocoded rather than read from storage.
    #[must_use]
    pub fn resolved_position(&self) -> Option<GeoPoint> {
        if self.event.has_coordinates() {
            None
        } else {
            self.position
        }
    }
}

async fn geocode_location(event: &OutageEvent, geocoder: &dyn Geocoder) -> Option<GeoPoint> {
    match geocoder.geocode(&event.location).await {
        Ok(Some(point)) => {
            debug!(id = %event.id, %point, "Coordinates resolved for display");
            Some(point)
        }
        Ok(None) => {
            debug!(id = %event.id, location = %event.location, "Location not found");
            None
        }
        Err(e) => {
            warn!(id = %event.id, error = %e, "Geocoding failed; leaving event unplaced");
            None
        }
    }
}

/// Place every event, geocoding the location of those without usable
/// coordinates.
///
/// The events themselves are left as stored. Events the geocoder cannot
/// place, or fails on, have no position.
pub async fn resolve_coordinates(
    events: Vec<OutageEvent>,
    geocoder: &dyn Geocoder,
) -> Vec<NearbyEvent> {
    let mut placed = Vec::with_capacity(events.len());
    for event in events {
        let mut nearby = NearbyEvent::new(event);
        if nearby.position.is_none() {
            nearby.position = geocode_location(&nearby.event, geocoder).await;
        }
        placed.push(nearby);
    }
    placed
}

/// Measure each event's distance from `user` and order them nearest first.
///
/// Events whose distance is unknown go last. Ties, including every event
/// when the user's position is unknown, keep their original order.
#[must_use]
pub fn rank_by_distance(events: Vec<NearbyEvent>, user: Option<GeoPoint>) -> Vec<NearbyEvent> {
    let mut ranked: Vec<NearbyEvent> = events
        .into_iter()
        .map(|mut nearby| {
            nearby.distance = Distance::between(user, nearby.position);
            nearby
        })
        .collect();
    ranked.sort_by(|a, b| compare(a.distance, b.distance));
    ranked
}

fn compare(a: Distance, b: Distance) -> Ordering {
    match (a, b) {
        (Distance::Known(a), Distance::Known(b)) => a.total_cmp(&b),
        (Distance::Known(_), Distance::Unknown) => Ordering::Less,
        (Distance::Unknown, Distance::Known(_)) => Ordering::Greater,
        (Distance::Unknown, Distance::Unknown) => Ordering::Equal,
    }
}

/// Place a single event and measure its distance from `user`.
///
/// When the stored coordinates are unusable and the user's position is
/// known, the event's location text is geocoded instead. Any failure
/// yields [`Distance::Unknown`].
pub async fn locate_event(
    event: OutageEvent,
    user: Option<GeoPoint>,
    geocoder: &dyn Geocoder,
) -> NearbyEvent {
    let mut nearby = NearbyEvent::new(event);
    if user.is_some() && nearby.position.is_none() {
        nearby.position = geocode_location(&nearby.event, geocoder).await;
    }
    nearby.distance = Distance::between(user, nearby.position);
    nearby
}

/// Shorten `text` to at most `width` characters, marking the cut with `…`.
///
/// Counts characters, not bytes, so multi-byte text is never split.
#[must_use]
pub fn truncate_label(text: &str, width: usize) -> String {
    match text.char_indices().nth(width) {
        None => text.to_string(),
        Some((cut, _)) => {
            let mut label = String::with_capacity(cut + ELLIPSIS.len_utf8());
            label.push_str(&text[..cut]);
            label.push(ELLIPSIS);
            label
        }
    }
}
