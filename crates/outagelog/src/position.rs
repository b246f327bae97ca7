//! Current-position providers.
//!
//! Reading the device position may be refused or may simply fail. Callers
//! that only need the position for distance labels should go through
//! [`locate_user`], which turns any failure into "position unknown".

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::PositionConfig;
use crate::error::{Error, Result};
use crate::geo::GeoPoint;

/// Source of the user's current position.
#[async_trait]
pub trait PositionProvider: Send + Sync + std::fmt::Debug {
    /// Get the current position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] if access was not granted, or
    /// [`Error::PositionUnavailable`] if no fix could be obtained.
    async fn current_position(&self) -> Result<GeoPoint>;
}

/// A position known up front (from configuration or the command line).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPosition(GeoPoint);

impl FixedPosition {
    /// Use `point` as the current position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinate`] if `point` is not valid.
    pub fn new(point: GeoPoint) -> Result<Self> {
        Ok(Self(GeoPoint::try_new(point.latitude, point.longitude)?))
    }
}

#[async_trait]
impl PositionProvider for FixedPosition {
    async fn current_position(&self) -> Result<GeoPoint> {
        Ok(self.0)
    }
}

/// A provider with no permission to read the position.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPosition;

#[async_trait]
impl PositionProvider for NoPosition {
    async fn current_position(&self) -> Result<GeoPoint> {
        Err(Error::PermissionDenied)
    }
}

/// Pick a provider: an explicit point wins over the configured one.
///
/// # Errors
///
/// Returns [`Error::InvalidCoordinate`] if the chosen point is invalid.
pub fn provider_for(
    explicit: Option<GeoPoint>,
    config: &PositionConfig,
) -> Result<Box<dyn PositionProvider>> {
    match explicit.or_else(|| config.point()) {
        Some(point) => Ok(Box::new(FixedPosition::new(point)?)),
        None => Ok(Box::new(NoPosition)),
    }
}

/// Current position, or `None` if it cannot be determined.
///
/// Denied permission and failed fixes are logged, never propagated.
pub async fn locate_user(provider: &dyn PositionProvider) -> Option<GeoPoint> {
    match provider.current_position().await {
        Ok(point) if point.is_valid() => {
            debug!(%point, "Current position acquired");
            Some(point)
        }
        Ok(point) => {
            warn!(%point, "Position provider returned an invalid point");
            None
        }
        Err(e) if e.is_permission_error() => {
            debug!("No permission to read the current position; distances unknown");
            None
        }
        Err(e) => {
            warn!(error = %e, "Could not determine current position; distances unknown");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NoFix;

    #[async_trait]
    impl PositionProvider for NoFix {
        async fn current_position(&self) -> Result<GeoPoint> {
            Err(Error::position_unavailable("no satellites"))
        }
    }

    #[derive(Debug)]
    struct Garbage;

    #[async_trait]
    impl PositionProvider for Garbage {
        async fn current_position(&self) -> Result<GeoPoint> {
            Ok(GeoPoint::new(f64::NAN, f64::NAN))
        }
    }

    #[tokio::test]
    async fn test_fixed_position() {
        let p = FixedPosition::new(GeoPoint::new(-23.5, -46.6)).unwrap();
        assert_eq!(
            p.current_position().await.unwrap(),
            GeoPoint::new(-23.5, -46.6)
        );
        assert_eq!(locate_user(&p).await, Some(GeoPoint::new(-23.5, -46.6)));
    }

    #[test]
    fn test_fixed_position_rejects_invalid() {
        assert!(FixedPosition::new(GeoPoint::new(200.0, 0.0)).is_err());
    }

    #[tokio::test]
    async fn test_no_position_is_permission_denied() {
        let err = NoPosition.current_position().await.unwrap_err();
        assert!(err.is_permission_error());
        assert_eq!(locate_user(&NoPosition).await, None);
    }

    #[tokio::test]
    async fn test_locate_user_degrades_failures() {
        assert_eq!(locate_user(&NoFix).await, None);
        assert_eq!(locate_user(&Garbage).await, None);
    }

    #[tokio::test]
    async fn test_provider_for_prefers_explicit() {
        let config = PositionConfig {
            latitude: Some(1.0),
            longitude: Some(1.0),
        };
        let provider = provider_for(Some(GeoPoint::new(2.0, 2.0)), &config).unwrap();
        assert_eq!(locate_user(provider.as_ref()).await, Some(GeoPoint::new(2.0, 2.0)));

        let provider = provider_for(None, &config).unwrap();
        assert_eq!(locate_user(provider.as_ref()).await, Some(GeoPoint::new(1.0, 1.0)));

        let provider = provider_for(None, &PositionConfig::default()).unwrap();
        assert_eq!(locate_user(provider.as_ref()).await, None);
    }
}
