//! Route solution types
//!
//! A solution is an ordering of the problem's stops plus the timing walk of
//! that ordering, built with the sequential schedule calculator.

use chrono::NaiveTime;
use serde::Serialize;

use super::problem::{CostModel, VrpProblem};
use crate::services::routing::DistanceTimeMatrices;
use crate::services::sequential_schedule::{compute_sequential_schedule, ScheduleInput};
use crate::types::CustomerId;

/// Optimized route solution
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSolution {
    /// Planned stops in order
    pub stops: Vec<PlannedStop>,
    /// Objective value under the solver's cost metric
    pub cost: u64,
    /// Total distance in meters, including any return leg
    pub total_distance_meters: u64,
    /// Total travel time in seconds (service time excluded)
    pub total_travel_seconds: u64,
    pub total_service_minutes: u32,
    /// Which algorithm produced the order
    pub algorithm: String,
    pub solve_time_ms: u64,
    pub iterations: usize,
    /// Warnings about the solution
    pub warnings: Vec<RouteWarning>,
}

/// A planned stop in the optimized route
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStop {
    pub customer_id: CustomerId,
    /// Index into `VrpProblem::stops`
    pub stop_index: usize,
    /// Order in the route (1-based)
    pub order: u32,
    pub arrival_time: NaiveTime,
    pub departure_time: NaiveTime,
    pub travel_minutes_from_previous: u32,
    pub distance_km_from_previous: f64,
}

/// Warning about the route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteWarning {
    /// Warning type code
    pub warning_type: String,
    /// Human-readable message
    pub message: String,
}

impl RouteWarning {
    pub fn new(warning_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            warning_type: warning_type.into(),
            message: message.into(),
        }
    }
}

impl RouteSolution {
    /// Create empty solution (for empty problems)
    pub fn empty() -> Self {
        Self {
            stops: vec![],
            cost: 0,
            total_distance_meters: 0,
            total_travel_seconds: 0,
            total_service_minutes: 0,
            algorithm: "none".to_string(),
            solve_time_ms: 0,
            iterations: 0,
            warnings: vec![],
        }
    }

    /// Build a solution from a route of matrix indices (`1..=n`)
    pub fn from_route(
        problem: &VrpProblem,
        matrices: &DistanceTimeMatrices,
        cost: &CostModel,
        route: &[usize],
        algorithm: &str,
    ) -> Self {
        let input = ScheduleInput {
            depot_matrix_idx: 0,
            service_minutes: route
                .iter()
                .map(|&mx| problem.stops[mx - 1].service_duration_minutes)
                .collect(),
            stop_matrix_indices: route.to_vec(),
            workday_start: problem.shift_start,
            return_to_depot: problem.return_to_depot,
        };
        let timing = compute_sequential_schedule(&input, &matrices.distances, &matrices.durations);

        let stops = route
            .iter()
            .zip(timing.stops.iter())
            .enumerate()
            .map(|(position, (&mx, computed))| PlannedStop {
                customer_id: problem.stops[mx - 1].customer_id,
                stop_index: mx - 1,
                order: (position + 1) as u32,
                arrival_time: computed.estimated_arrival,
                departure_time: computed.estimated_departure,
                travel_minutes_from_previous: computed.duration_from_previous_minutes,
                distance_km_from_previous: computed.distance_from_previous_km,
            })
            .collect();

        Self {
            stops,
            cost: cost.route_cost(route),
            total_distance_meters: timing.total_distance_meters,
            total_travel_seconds: timing.total_travel_seconds,
            total_service_minutes: timing.total_service_minutes,
            algorithm: algorithm.to_string(),
            solve_time_ms: 0,
            iterations: 0,
            warnings: vec![],
        }
    }

    /// Stop order as customer ids
    #[cfg(test)]
    pub fn customer_order(&self) -> Vec<CustomerId> {
        self.stops.iter().map(|s| s.customer_id).collect()
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_meters as f64 / 1000.0
    }

    pub fn total_travel_minutes(&self) -> u32 {
        (self.total_travel_seconds as f64 / 60.0).ceil() as u32
    }
}
