//! VRP Problem types

use chrono::NaiveTime;

use super::config::CostMetric;
use crate::services::routing::DistanceTimeMatrices;
use crate::types::{Coordinates, Customer, CustomerId};

/// Single-vehicle routing problem for one day.
///
/// Matrix index 0 is the start location, index `i + 1` is `stops[i]`.
#[derive(Debug, Clone)]
pub struct VrpProblem {
    /// Starting point
    pub depot: Depot,
    /// Stops to visit, sorted by customer id
    pub stops: Vec<VrpStop>,
    /// Departure time from the start location
    pub shift_start: NaiveTime,
    /// Close the tour with a leg back to the start
    pub return_to_depot: bool,
}

/// Start location. Without coordinates the route may begin at any stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Depot {
    pub coordinates: Option<Coordinates>,
}

/// A stop in the VRP problem
#[derive(Debug, Clone, PartialEq)]
pub struct VrpStop {
    pub customer_id: CustomerId,
    pub coordinates: Coordinates,
    pub service_duration_minutes: u32,
}

impl VrpStop {
    pub fn from_customer(customer: &Customer) -> Self {
        Self {
            customer_id: customer.id,
            coordinates: customer.coordinates,
            service_duration_minutes: customer.estimated_duration_minutes,
        }
    }
}

impl VrpProblem {
    /// Build a problem with stops in canonical (id) order
    pub fn new(
        depot: Depot,
        mut stops: Vec<VrpStop>,
        shift_start: NaiveTime,
        return_to_depot: bool,
    ) -> Self {
        stops.sort_by_key(|s| s.customer_id);
        Self {
            depot,
            stops,
            shift_start,
            return_to_depot,
        }
    }

    pub fn has_fixed_start(&self) -> bool {
        self.depot.coordinates.is_some()
    }

    /// Locations in matrix order. A free start borrows the first stop's
    /// coordinates; its legs are zeroed by [`Self::prepare_matrices`].
    pub fn locations(&self) -> Vec<Coordinates> {
        let start = self
            .depot
            .coordinates
            .or_else(|| self.stops.first().map(|s| s.coordinates));
        start
            .into_iter()
            .chain(self.stops.iter().map(|s| s.coordinates))
            .collect()
    }

    /// Adapt provider matrices to this problem's start semantics
    pub fn prepare_matrices(&self, matrices: DistanceTimeMatrices) -> DistanceTimeMatrices {
        if self.has_fixed_start() {
            matrices
        } else {
            matrices.with_free_start()
        }
    }

    /// Position of a stop in `stops` by customer id
    pub fn stop_index(&self, customer_id: CustomerId) -> Option<usize> {
        self.stops
            .binary_search_by_key(&customer_id, |s| s.customer_id)
            .ok()
    }
}

/// Arc costs of one problem under the chosen metric.
///
/// Routes are sequences of matrix indices `1..=n`; index 0 is the start.
#[derive(Debug, Clone)]
pub struct CostModel {
    arcs: Vec<Vec<u64>>,
    closed: bool,
}

impl CostModel {
    pub fn new(matrices: &DistanceTimeMatrices, metric: CostMetric, closed: bool) -> Self {
        let arcs = match metric {
            CostMetric::Distance => matrices.distances.clone(),
            CostMetric::Duration => matrices.durations.clone(),
        };
        Self { arcs, closed }
    }

    /// Number of stops (excluding the start)
    pub fn stop_count(&self) -> usize {
        self.arcs.len().saturating_sub(1)
    }

    pub fn arc(&self, from: usize, to: usize) -> u64 {
        self.arcs[from][to]
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Total cost of visiting `route` from the start
    pub fn route_cost(&self, route: &[usize]) -> u64 {
        let Some(&last) = route.last() else {
            return 0;
        };
        let mut cost = self.arc(0, route[0]);
        for pair in route.windows(2) {
            cost += self.arc(pair[0], pair[1]);
        }
        if self.closed {
            cost += self.arc(last, 0);
        }
        cost
    }
}
