//! Great-circle distance between geographic points.
//!
//! Uses the haversine formula on a spherical Earth. The calculation is pure
//! and stateless; callers are expected to check coordinates first and treat
//! a NaN result as "distance unknown".

use std::fmt;

use crate::geo::GeoPoint;

/// Mean Earth radius used by the haversine formula, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between `a` and `b` in kilometers.
///
/// Symmetric, zero for identical points and never negative. Returns NaN only
/// when an input component is NaN.
#[must_use]
pub fn compute(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points.
    let h = h.min(1.0);
    let angular_distance = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * angular_distance
}

/// Distance between the user and an event, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distance {
    /// A computed distance in kilometers.
    Known(f64),
    /// One of the endpoints has no usable coordinates.
    Unknown,
}

impl Distance {
    /// Distance between two optional points.
    ///
    /// Missing or invalid points, or a non-finite result, give [`Distance::Unknown`].
    #[must_use]
    pub fn between(from: Option<GeoPoint>, to: Option<GeoPoint>) -> Self {
        match (from, to) {
            (Some(a), Some(b)) if a.is_valid() && b.is_valid() => Self::from_km(compute(a, b)),
            _ => Self::Unknown,
        }
    }

    /// Wrap a raw kilometer value; NaN and negative values become unknown.
    #[must_use]
    pub fn from_km(km: f64) -> Self {
        if km.is_finite() && km >= 0.0 {
            Self::Known(km)
        } else {
            Self::Unknown
        }
    }

    /// Kilometers, if known.
    #[must_use]
    pub fn km(&self) -> Option<f64> {
        match self {
            Self::Known(km) => Some(*km),
            Self::Unknown => None,
        }
    }

    /// Whether the distance could be computed.
    #[must_use]
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Render as `"12.3 km"` with `precision` decimals, or `placeholder`.
    #[must_use]
    pub fn format(&self, precision: usize, placeholder: &str) -> String {
        match self {
            Self::Known(km) => format!("{km:.precision$} km"),
            Self::Unknown => placeholder.to_string(),
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(1, "— km"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAO_PAULO: GeoPoint = GeoPoint::new(-23.5505, -46.6333);
    const RIO: GeoPoint = GeoPoint::new(-22.9068, -43.1729);

    #[test]
    fn test_same_point_is_zero() {
        assert!(compute(SAO_PAULO, SAO_PAULO).abs() < f64::EPSILON);
        let origin = GeoPoint::new(0.0, 0.0);
        assert!(compute(origin, origin).abs() < f64::EPSILON);
    }

    #[test]
    fn test_one_degree_longitude_at_equator() {
        let d = compute(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            (SAO_PAULO, RIO),
            (GeoPoint::new(51.5, -0.12), GeoPoint::new(40.71, -74.0)),
            (GeoPoint::new(89.9, 10.0), GeoPoint::new(-89.9, -170.0)),
        ];
        for (a, b) in pairs {
            assert!((compute(a, b) - compute(b, a)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sao_paulo_to_rio() {
        let d = compute(SAO_PAULO, RIO);
        assert!((d - 361.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn test_monotonic_along_meridian() {
        let origin = GeoPoint::new(0.0, 0.0);
        let mut last = 0.0;
        for lat in 1..=90 {
            let d = compute(origin, GeoPoint::new(f64::from(lat), 0.0));
            assert!(d > last);
            last = d;
        }
    }

    #[test]
    fn test_antipodal_is_half_circumference() {
        let d = compute(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
        assert!(d >= 0.0);
    }

    #[test]
    fn test_nan_input_propagates() {
        let d = compute(GeoPoint::new(f64::NAN, 0.0), SAO_PAULO);
        assert!(d.is_nan());
    }

    #[test]
    fn test_distance_between_unknown_when_missing() {
        assert_eq!(Distance::between(None, Some(RIO)), Distance::Unknown);
        assert_eq!(Distance::between(Some(RIO), None), Distance::Unknown);
        assert_eq!(
            Distance::between(Some(GeoPoint::new(f64::NAN, 1.0)), Some(RIO)),
            Distance::Unknown
        );
    }

    #[test]
    fn test_distance_between_known() {
        let d = Distance::between(Some(SAO_PAULO), Some(RIO));
        assert!(d.is_known());
        assert!(d.km().unwrap() > 300.0);
    }

    #[test]
    fn test_from_km_rejects_nan() {
        assert_eq!(Distance::from_km(f64::NAN), Distance::Unknown);
        assert_eq!(Distance::from_km(-1.0), Distance::Unknown);
        assert_eq!(Distance::from_km(2.5), Distance::Known(2.5));
    }

    #[test]
    fn test_format() {
        assert_eq!(Distance::Known(12.345).format(1, "—"), "12.3 km");
        assert_eq!(Distance::Known(12.345).format(0, "—"), "12 km");
        assert_eq!(Distance::Unknown.format(1, "— km"), "— km");
        assert_eq!(Distance::Known(3.0).to_string(), "3.0 km");
        assert_eq!(Distance::Unknown.to_string(), "— km");
    }
}
