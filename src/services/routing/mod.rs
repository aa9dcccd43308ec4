//! Routing service for distance/time matrix calculations
//!
//! Uses straight-line estimates by default, Valhalla when configured.

mod valhalla;

pub use valhalla::{ValhallaClient, ValhallaConfig};

use async_trait::async_trait;
use anyhow::Result;
use tracing::warn;

use crate::services::geo::GeoEstimator;
use crate::types::Coordinates;

/// Distance and time matrices between locations
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceTimeMatrices {
    /// Distance in meters [i][j] from location i to location j
    pub distances: Vec<Vec<u64>>,
    /// Duration in seconds [i][j] from location i to location j
    pub durations: Vec<Vec<u64>>,
    /// Number of locations
    pub size: usize,
}

impl DistanceTimeMatrices {
    /// Create empty matrices
    pub fn empty() -> Self {
        Self {
            distances: vec![],
            durations: vec![],
            size: 0,
        }
    }

    /// Make location 0 a free start: every leg into or out of it costs nothing.
    ///
    /// Used when the caller supplies no start location, so the route may begin
    /// at whichever stop is best.
    pub fn with_free_start(mut self) -> Self {
        for i in 0..self.size {
            self.distances[0][i] = 0;
            self.distances[i][0] = 0;
            self.durations[0][i] = 0;
            self.durations[i][0] = 0;
        }
        self
    }
}

/// Routing service trait for abstraction (geo estimate, Valhalla, ...)
#[async_trait]
pub trait RoutingService: Send + Sync {
    /// Get distance and time matrices for a list of locations.
    /// First location is the start location.
    async fn get_matrices(&self, locations: &[Coordinates]) -> Result<DistanceTimeMatrices>;

    /// Probe the service before a run; an error means it cannot be used at all
    async fn check_available(&self) -> Result<()> {
        Ok(())
    }

    /// Get service name for logging
    fn name(&self) -> &str;
}

/// Haversine × road coefficient estimates; always available
#[derive(Debug, Clone, Default)]
pub struct GeoRoutingService {
    estimator: GeoEstimator,
}

impl GeoRoutingService {
    pub fn new(estimator: GeoEstimator) -> Self {
        Self { estimator }
    }
}

#[async_trait]
impl RoutingService for GeoRoutingService {
    async fn get_matrices(&self, locations: &[Coordinates]) -> Result<DistanceTimeMatrices> {
        Ok(self.estimator.matrices(locations))
    }

    fn name(&self) -> &str {
        "GeoEstimate"
    }
}

/// Create routing service based on configuration.
///
/// No silent fallback: if Valhalla is configured but down, the pre-run availability check
/// reports it to the caller.
pub fn create_routing_service(
    valhalla_url: Option<&str>,
    estimator: GeoEstimator,
) -> Result<Box<dyn RoutingService>> {
    match valhalla_url {
        Some(url) => Ok(Box::new(ValhallaClient::new(ValhallaConfig::new(url), estimator)?)),
        None => Ok(Box::new(GeoRoutingService::new(estimator))),
    }
}

/// Matrices from `service`, or the straight-line estimate if it fails.
///
/// The second value describes the fallback when one was used.
pub async fn matrices_or_estimate(
    service: &dyn RoutingService,
    estimator: &GeoEstimator,
    locations: &[Coordinates],
) -> (DistanceTimeMatrices, Option<String>) {
    match service.get_matrices(locations).await {
        Ok(matrices) if matrices.size == locations.len() => (matrices, None),
        Ok(matrices) => {
            let message = format!(
                "{} returned {} locations for {}, used straight-line estimate",
                service.name(),
                matrices.size,
                locations.len()
            );
            warn!("{}", message);
            (estimator.matrices(locations), Some(message))
        }
        Err(err) => {
            let message = format!("{} failed, used straight-line estimate: {:#}", service.name(), err);
            warn!("{}", message);
            (estimator.matrices(locations), Some(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn london() -> Coordinates {
        Coordinates { lat: 51.5074, lng: -0.1278 }
    }

    fn brighton() -> Coordinates {
        Coordinates { lat: 50.8225, lng: -0.1372 }
    }

    fn oxford() -> Coordinates {
        Coordinates { lat: 51.7520, lng: -1.2577 }
    }

    #[tokio::test]
    async fn test_geo_routing_empty_locations() {
        let service = GeoRoutingService::default();
        let matrices = service.get_matrices(&[]).await.unwrap();

        assert_eq!(matrices.size, 0);
        assert!(matrices.distances.is_empty());
    }

    #[tokio::test]
    async fn test_geo_routing_two_locations() {
        let service = GeoRoutingService::default();
        let matrices = service.get_matrices(&[london(), brighton()]).await.unwrap();

        assert_eq!(matrices.size, 2);
        assert_eq!(matrices.distances[0][0], 0);

        // ~76 km straight line, ~99 km road estimate
        let distance_km = matrices.distances[0][1] as f64 / 1000.0;
        assert!(distance_km > 90.0 && distance_km < 110.0, "got {} km", distance_km);
        assert_eq!(matrices.distances[0][1], matrices.distances[1][0]);

        // ~99 km at 40 km/h is roughly 2.5 hours
        let hours = matrices.durations[0][1] as f64 / 3600.0;
        assert!(hours > 2.0 && hours < 3.0, "got {} hours", hours);
    }

    #[tokio::test]
    async fn test_geo_routing_custom_params() {
        let service = GeoRoutingService::new(GeoEstimator::new(1.5, 60.0));
        let matrices = service.get_matrices(&[london(), brighton()]).await.unwrap();

        let distance_km = matrices.distances[0][1] as f64 / 1000.0;
        assert!(distance_km > 105.0 && distance_km < 125.0, "got {} km", distance_km);
    }

    #[tokio::test]
    async fn test_free_start_zeroes_first_row_and_column() {
        let service = GeoRoutingService::default();
        let matrices = service
            .get_matrices(&[london(), brighton(), oxford()])
            .await
            .unwrap()
            .with_free_start();

        for i in 0..3 {
            assert_eq!(matrices.distances[0][i], 0);
            assert_eq!(matrices.distances[i][0], 0);
            assert_eq!(matrices.durations[i][0], 0);
        }
        assert!(matrices.distances[1][2] > 0);
    }

    #[tokio::test]
    async fn test_geo_service_always_available() {
        let service = GeoRoutingService::default();
        assert!(service.check_available().await.is_ok());
        assert_eq!(service.name(), "GeoEstimate");
    }

    #[test]
    fn test_create_routing_service_selects_backend() {
        let geo = create_routing_service(None, GeoEstimator::default()).unwrap();
        assert_eq!(geo.name(), "GeoEstimate");

        let valhalla =
            create_routing_service(Some("http://localhost:8002"), GeoEstimator::default()).unwrap();
        assert_eq!(valhalla.name(), "Valhalla");
    }

    struct DownService;

    #[async_trait]
    impl RoutingService for DownService {
        async fn get_matrices(&self, _locations: &[Coordinates]) -> Result<DistanceTimeMatrices> {
            anyhow::bail!("connection refused")
        }

        fn name(&self) -> &str {
            "Down"
        }
    }

    #[tokio::test]
    async fn test_matrices_fall_back_to_estimate() {
        let estimator = GeoEstimator::default();
        let points = [london(), oxford()];

        let (matrices, warning) = matrices_or_estimate(&DownService, &estimator, &points).await;
        assert_eq!(matrices, estimator.matrices(&points));
        assert!(warning.unwrap().contains("connection refused"));

        let (_, warning) = matrices_or_estimate(&GeoRoutingService::default(), &estimator, &points).await;
        assert!(warning.is_none());
    }
}
