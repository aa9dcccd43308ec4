//! Geographic calculations

use rayon::prelude::*;

use crate::services::routing::DistanceTimeMatrices;
use crate::types::Coordinates;

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Road distance coefficient (straight line to road)
pub const ROAD_COEFFICIENT: f64 = 1.3;

/// Average speed in km/h for travel time estimation
pub const AVERAGE_SPEED_KMH: f64 = 40.0;

/// Calculate Haversine distance between two points in kilometers
pub fn haversine_distance(from: &Coordinates, to: &Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lng - from.lng).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Straight-line distance scaled to road distance, with travel time at a fixed average speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoEstimator {
    pub road_coefficient: f64,
    pub average_speed_kmh: f64,
}

impl Default for GeoEstimator {
    fn default() -> Self {
        Self {
            road_coefficient: ROAD_COEFFICIENT,
            average_speed_kmh: AVERAGE_SPEED_KMH,
        }
    }
}

impl GeoEstimator {
    pub fn new(road_coefficient: f64, average_speed_kmh: f64) -> Self {
        Self {
            road_coefficient,
            average_speed_kmh,
        }
    }

    /// Estimated road distance in kilometers
    pub fn road_distance_km(&self, from: &Coordinates, to: &Coordinates) -> f64 {
        haversine_distance(from, to) * self.road_coefficient
    }

    /// Estimated travel time in minutes
    pub fn travel_time_minutes(&self, from: &Coordinates, to: &Coordinates) -> f64 {
        self.road_distance_km(from, to) / self.average_speed_kmh * 60.0
    }

    /// Road distance (meters) and travel time (seconds) for one leg
    fn leg(&self, from: &Coordinates, to: &Coordinates) -> (u64, u64) {
        let road_km = self.road_distance_km(from, to);
        let meters = (road_km * 1000.0).round() as u64;
        let seconds = (road_km / self.average_speed_kmh * 3600.0).round() as u64;
        (meters, seconds)
    }

    /// Full pairwise matrices; rows are computed in parallel
    pub fn matrices(&self, points: &[Coordinates]) -> DistanceTimeMatrices {
        let n = points.len();
        if n == 0 {
            return DistanceTimeMatrices::empty();
        }

        let rows: Vec<(Vec<u64>, Vec<u64>)> = points
            .par_iter()
            .enumerate()
            .map(|(i, from)| {
                let mut distances = vec![0u64; n];
                let mut durations = vec![0u64; n];
                for (j, to) in points.iter().enumerate() {
                    if i != j {
                        let (meters, seconds) = self.leg(from, to);
                        distances[j] = meters;
                        durations[j] = seconds;
                    }
                }
                (distances, durations)
            })
            .collect();

        let (distances, durations): (Vec<Vec<u64>>, Vec<Vec<u64>>) = rows.into_iter().unzip();
        DistanceTimeMatrices {
            distances,
            durations,
            size: n,
        }
    }
}
