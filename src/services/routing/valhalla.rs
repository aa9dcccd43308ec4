//! Valhalla routing engine client
//!
//! Valhalla API documentation:
//! https://valhalla.github.io/valhalla/api/matrix/api-reference/

use async_trait::async_trait;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::services::geo::GeoEstimator;
use crate::types::Coordinates;
use super::{DistanceTimeMatrices, RoutingService};

/// Valhalla client configuration
#[derive(Debug, Clone)]
pub struct ValhallaConfig {
    /// Base URL of Valhalla server (e.g., "http://localhost:8002")
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for ValhallaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8002".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl ValhallaConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Valhalla road-network matrix client
pub struct ValhallaClient {
    client: Client,
    config: ValhallaConfig,
    /// Fills cells Valhalla could not route (e.g. a stop on an island)
    estimator: GeoEstimator,
}

impl ValhallaClient {
    pub fn new(config: ValhallaConfig, estimator: GeoEstimator) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            config,
            estimator,
        })
    }

    /// Build the sources_to_targets request
    fn build_matrix_request(&self, locations: &[Coordinates]) -> MatrixRequest {
        let locs: Vec<ValhallaLocation> = locations
            .iter()
            .map(|c| ValhallaLocation {
                lat: c.lat,
                lon: c.lng,
                // Customer pins are usually building centroids, not road edges
                radius: Some(500),
            })
            .collect();

        MatrixRequest {
            sources: locs.clone(),
            targets: locs,
            costing: "auto".to_string(),
            units: "kilometers".to_string(),
        }
    }

    fn convert_response(
        &self,
        locations: &[Coordinates],
        response: MatrixResponse,
    ) -> Result<DistanceTimeMatrices> {
        let n = locations.len();
        if response.sources_to_targets.len() != n {
            anyhow::bail!(
                "Valhalla returned {} rows for {} locations",
                response.sources_to_targets.len(),
                n
            );
        }

        let mut distances = vec![vec![0u64; n]; n];
        let mut durations = vec![vec![0u64; n]; n];

        for (i, row) in response.sources_to_targets.iter().enumerate() {
            for (j, cell) in row.iter().enumerate().take(n) {
                if i == j {
                    continue;
                }
                match (cell.distance, cell.time) {
                    (Some(km), Some(seconds)) => {
                        distances[i][j] = (km * 1000.0).round() as u64;
                        durations[i][j] = seconds.round() as u64;
                    }
                    _ => {
                        warn!("No Valhalla route {} -> {}, using straight-line estimate", i, j);
                        let km = self.estimator.road_distance_km(&locations[i], &locations[j]);
                        distances[i][j] = (km * 1000.0).round() as u64;
                        durations[i][j] = (self
                            .estimator
                            .travel_time_minutes(&locations[i], &locations[j])
                            * 60.0)
                            .round() as u64;
                    }
                }
            }
        }

        Ok(DistanceTimeMatrices {
            distances,
            durations,
            size: n,
        })
    }
}

#[async_trait]
impl RoutingService for ValhallaClient {
    async fn get_matrices(&self, locations: &[Coordinates]) -> Result<DistanceTimeMatrices> {
        let n = locations.len();

        if n == 0 {
            return Ok(DistanceTimeMatrices::empty());
        }

        if n == 1 {
            return Ok(DistanceTimeMatrices {
                distances: vec![vec![0]],
                durations: vec![vec![0]],
                size: 1,
            });
        }

        let request = self.build_matrix_request(locations);
        let url = format!("{}/sources_to_targets", self.config.base_url);

        debug!("Requesting distance matrix from Valhalla for {} locations", n);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Valhalla")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Valhalla returned error {}: {}", status, body);
        }

        let matrix_response: MatrixResponse = response
            .json()
            .await
            .context("Failed to parse Valhalla response")?;

        self.convert_response(locations, matrix_response)
    }

    async fn check_available(&self) -> Result<()> {
        let url = format!("{}/status", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Valhalla not reachable at {}", self.config.base_url))?;

        if response.status().is_success() {
            Ok(())
        } else {
            anyhow::bail!("Valhalla returned status {}", response.status())
        }
    }

    fn name(&self) -> &str {
        "Valhalla"
    }
}

// Valhalla API types

#[derive(Debug, Serialize)]
struct MatrixRequest {
    sources: Vec<ValhallaLocation>,
    targets: Vec<ValhallaLocation>,
    costing: String,
    units: String,
}

#[derive(Debug, Serialize, Clone)]
struct ValhallaLocation {
    lat: f64,
    lon: f64,
    /// Radius in meters for snapping to roads
    #[serde(skip_serializing_if = "Option::is_none")]
    radius: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    sources_to_targets: Vec<Vec<MatrixCell>>,
}

#[derive(Debug, Deserialize)]
struct MatrixCell {
    /// Distance in kilometers (when units="kilometers")
    distance: Option<f64>,
    /// Time in seconds
    time: Option<f64>,
}
