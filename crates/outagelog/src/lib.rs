//! `outagelog` - A local log of power outages
//!
//! Records outage events (where, for how long, what was damaged) in a local
//! key-value store and computes great-circle distances between the user and
//! each event.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod distance;
pub mod error;
pub mod event;
pub mod geo;
pub mod geocode;
pub mod logging;
pub mod position;
pub mod proximity;
pub mod storage;
pub mod store;
pub mod tips;

pub use config::Config;
pub use distance::Distance;
pub use error::{Error, Result};
pub use event::{EventDraft, EventId, OutageEvent};
pub use geo::GeoPoint;
pub use logging::init_logging;
pub use store::EventStore;
