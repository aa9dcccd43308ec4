//! VRP (Vehicle Routing Problem) solver
//!
//! Orders one day's stops into a single-vehicle route. One or two stops are
//! enumerated; larger days go to a seeded iterated local search built on
//! u-routing's 2-opt and Or-opt operators. The search runs on a blocking
//! thread under a hard timeout, with a nearest-neighbour route as the
//! fallback.

mod config;
mod local_search;
mod problem;
mod solution;
mod solver;

pub use config::{SolverConfig, MAX_ROUTE_STOPS};
pub use problem::{Depot, VrpProblem, VrpStop};
pub use solution::{RouteSolution, RouteWarning};
pub use solver::fixed_order_solution;

use solution::PlannedStop;
use solver::{nearest_neighbor_solution, RouteSolver, VrpSolver};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::services::routing::DistanceTimeMatrices;

/// Runs a [`RouteSolver`] off the async runtime and never fails
#[derive(Clone)]
pub struct RouteOptimizer {
    solver: Arc<dyn RouteSolver>,
    config: SolverConfig,
}

impl RouteOptimizer {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            solver: Arc::new(VrpSolver::new(config.clone())),
            config,
        }
    }

    /// Use a custom solver; `config` still sets the time budget and fallback metric
    pub fn with_solver(solver: Arc<dyn RouteSolver>, config: SolverConfig) -> Self {
        Self { solver, config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Order the problem's stops.
    ///
    /// `matrices` must already be prepared for the problem
    /// ([`VrpProblem::prepare_matrices`]). A solver error, panic or timeout
    /// yields the nearest-neighbour route with a warning attached.
    pub async fn optimize(&self, problem: &VrpProblem, matrices: &DistanceTimeMatrices) -> RouteSolution {
        if problem.stops.is_empty() {
            return RouteSolution::empty();
        }

        let started_at = Instant::now();
        let deadline = started_at + Duration::from_millis(self.config.time_limit_ms);
        let hard_timeout = Duration::from_millis(self.config.hard_timeout_ms());

        let solver = Arc::clone(&self.solver);
        let owned_problem = problem.clone();
        let owned_matrices = matrices.clone();
        let handle = tokio::task::spawn_blocking(move || {
            solver.solve(&owned_problem, &owned_matrices, Some(deadline))
        });

        let failure = match tokio::time::timeout(hard_timeout, handle).await {
            Ok(Ok(Ok(solution))) => {
                info!(
                    "Route optimized by {}: {} stops, {:.1} km, {} min travel ({})",
                    self.solver.name(),
                    solution.stops.len(),
                    solution.total_distance_km(),
                    solution.total_travel_minutes(),
                    solution.algorithm
                );
                return solution;
            }
            Ok(Ok(Err(err))) => RouteWarning::new("SOLVER_FAILED", format!("solver error: {}", err)),
            Ok(Err(join_err)) => {
                RouteWarning::new("SOLVER_FAILED", format!("solver task failed: {}", join_err))
            }
            Err(_) => RouteWarning::new(
                "SOLVER_TIMEOUT",
                format!("solver exceeded {} ms", hard_timeout.as_millis()),
            ),
        };

        warn!("{}, falling back to nearest neighbour", failure.message);
        self.fallback(problem, matrices, failure, started_at)
    }

    fn fallback(
        &self,
        problem: &VrpProblem,
        matrices: &DistanceTimeMatrices,
        failure: RouteWarning,
        started_at: Instant,
    ) -> RouteSolution {
        let mut solution = match nearest_neighbor_solution(problem, matrices, self.config.cost_metric) {
            Ok(solution) => solution,
            Err(err) => {
                // Malformed matrices: keep the canonical order rather than drop stops
                warn!("Nearest neighbour fallback failed: {}", err);
                let mut solution = RouteSolution::empty();
                solution.algorithm = "input_order".to_string();
                solution.stops = problem
                    .stops
                    .iter()
                    .enumerate()
                    .map(|(index, stop)| PlannedStop {
                        customer_id: stop.customer_id,
                        stop_index: index,
                        order: index as u32 + 1,
                        arrival_time: problem.shift_start,
                        departure_time: problem.shift_start,
                        travel_minutes_from_previous: 0,
                        distance_km_from_previous: 0.0,
                    })
                    .collect();
                solution
            }
        };
        solution.warnings.push(failure);
        solution.solve_time_ms = started_at.elapsed().as_millis() as u64;
        solution
    }
}

impl Default for RouteOptimizer {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}
