//! Text and JSON rendering of events for the terminal.

use serde::Serialize;

use crate::config::DisplayConfig;
use crate::event::OutageEvent;
use crate::geo::GeoPoint;
use crate::proximity::{truncate_label, NearbyEvent};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// JSON view of a stored event with its distance.
///
/// Coordinates geocoded for display are reported apart from the stored
/// ones, which stay `null` when unknown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventView<'a> {
    #[serde(flatten)]
    event: &'a OutageEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_coordinates: Option<GeoPoint>,
    distance_km: Option<f64>,
}

impl<'a> From<&'a NearbyEvent> for EventView<'a> {
    fn from(nearby: &'a NearbyEvent) -> Self {
        Self {
            event: &nearby.event,
            resolved_coordinates: nearby.resolved_position(),
            distance_km: nearby.distance.km(),
        }
    }
}

/// Free text flattened onto one line so it cannot break a row.
fn cell(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Short label: flattened, then cut to `width` characters.
fn label(text: &str, width: usize) -> String {
    truncate_label(&cell(text), width)
}

fn distance(nearby: &NearbyEvent, display: &DisplayConfig) -> String {
    nearby
        .distance
        .format(display.distance_precision, &display.unknown_distance)
}

/// One line per event: id, label, distance and damages summary.
#[must_use]
pub fn plain(events: &[NearbyEvent], display: &DisplayConfig) -> String {
    let mut out = String::new();
    for nearby in events {
        let event = &nearby.event;
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            event.id,
            label(&event.location, display.label_width),
            distance(nearby, display),
            label(&event.damages, display.summary_width),
        ));
    }
    out
}

/// Events in aligned columns under a header.
#[must_use]
pub fn table(events: &[NearbyEvent], display: &DisplayConfig) -> String {
    const HEADER: [&str; 5] = ["ID", "LOCATION", "DISTANCE", "DURATION", "DAMAGES"];

    let rows: Vec<[String; 5]> = events
        .iter()
        .map(|nearby| {
            let event = &nearby.event;
            [
                event.id.to_string(),
                label(&event.location, display.label_width),
                distance(nearby, display),
                cell(&event.outage_duration),
                label(&event.damages, display.summary_width),
            ]
        })
        .collect();

    let mut widths = HEADER.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADER, &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize]) {
    let last = cells.len().saturating_sub(1);
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        let cell = cell.as_ref();
        out.push_str(cell);
        if i < last {
            let pad = width.saturating_sub(cell.chars().count()) + 2;
            out.extend(std::iter::repeat(' ').take(pad));
        }
    }
    out.push('\n');
}

/// Pretty-printed JSON array of events with a `distanceKm` field.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn json(events: &[NearbyEvent]) -> serde_json::Result<String> {
    let views: Vec<EventView<'_>> = events.iter().map(EventView::from).collect();
    serde_json::to_string_pretty(&views)
}

/// Pretty-printed JSON object for a single event.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn json_detail(nearby: &NearbyEvent) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&EventView::from(nearby))
}

/// Every field of one event, untruncated.
#[must_use]
pub fn detail(nearby: &NearbyEvent, display: &DisplayConfig) -> String {
    let event = &nearby.event;
    let coordinates = match (event.coordinates(), nearby.resolved_position()) {
        (Some(stored), _) => stored.to_string(),
        (None, Some(resolved)) => format!("{resolved} (from location)"),
        (None, None) => "unknown".to_string(),
    };
    let recorded_at = event.recorded_time().map_or_else(
        || event.recorded_at.clone(),
        |t| t.format(TIME_FORMAT).to_string(),
    );

    format!(
        "Event {}\n\
         Location:     {}\n\
         Coordinates:  {}\n\
         Distance:     {}\n\
         Duration:     {}\n\
         Damages:      {}\n\
         Recorded at:  {}\n",
        event.id,
        event.location,
        coordinates,
        distance(nearby, display),
        event.outage_duration,
        event.damages,
        recorded_at,
    )
}
