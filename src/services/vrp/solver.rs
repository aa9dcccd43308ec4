//! Route solver dispatch

use std::time::Instant;

use anyhow::{bail, Result};
use tracing::debug;

use super::config::{CostMetric, SolverConfig, MAX_ROUTE_STOPS};
use super::local_search::{iterated_local_search, nearest_neighbor};
use super::problem::{CostModel, VrpProblem};
use super::solution::{RouteSolution, RouteWarning};
use crate::services::routing::DistanceTimeMatrices;
use crate::types::CustomerId;

/// Narrow interface between the orchestrator and a route solving algorithm.
///
/// Implementations are synchronous and CPU-bound; callers run them on a
/// blocking thread. `deadline` is cooperative.
pub trait RouteSolver: Send + Sync {
    fn solve(
        &self,
        problem: &VrpProblem,
        matrices: &DistanceTimeMatrices,
        deadline: Option<Instant>,
    ) -> Result<RouteSolution>;

    fn name(&self) -> &str;
}

/// Enumeration for one or two stops, iterated local search above that
pub struct VrpSolver {
    config: SolverConfig,
}

impl VrpSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }
}

impl Default for VrpSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl RouteSolver for VrpSolver {
    fn solve(
        &self,
        problem: &VrpProblem,
        matrices: &DistanceTimeMatrices,
        deadline: Option<Instant>,
    ) -> Result<RouteSolution> {
        let started_at = Instant::now();

        if problem.stops.is_empty() {
            debug!("No stops to optimize, returning empty solution");
            return Ok(RouteSolution::empty());
        }
        check_matrix_size(problem, matrices)?;

        let cost = CostModel::new(matrices, self.config.cost_metric, problem.return_to_depot);
        let n = problem.stops.len();

        let mut warnings = Vec::new();
        let (route, algorithm, iterations) = if n <= 2 {
            (enumerate(&cost), "enumeration", 0)
        } else {
            let budget = self.config.iteration_budget(n);
            let outcome = iterated_local_search(&cost, budget, self.config.seed, deadline);
            if outcome.timed_out {
                warnings.push(RouteWarning::new(
                    "SEARCH_TIME_LIMIT",
                    format!(
                        "search stopped by the {} ms time limit, construction route kept",
                        self.config.time_limit_ms
                    ),
                ));
            }
            (outcome.route, "local_search", outcome.iterations)
        };

        let mut solution = RouteSolution::from_route(problem, matrices, &cost, &route, algorithm);
        solution.iterations = iterations;
        solution.warnings = warnings;
        solution.solve_time_ms = started_at.elapsed().as_millis() as u64;

        debug!(
            "Solved {} stops with {}: cost={} iterations={} time_ms={}",
            n, algorithm, solution.cost, iterations, solution.solve_time_ms
        );

        Ok(solution)
    }

    fn name(&self) -> &str {
        "vrp"
    }
}

/// Nearest-neighbour route; never fails on a well-formed problem
pub fn nearest_neighbor_solution(
    problem: &VrpProblem,
    matrices: &DistanceTimeMatrices,
    metric: CostMetric,
) -> Result<RouteSolution> {
    if problem.stops.is_empty() {
        return Ok(RouteSolution::empty());
    }
    check_matrix_size(problem, matrices)?;
    let cost = CostModel::new(matrices, metric, problem.return_to_depot);
    let route = nearest_neighbor(&cost);
    Ok(RouteSolution::from_route(problem, matrices, &cost, &route, "nearest_neighbor"))
}

/// Solution visiting the stops in the given customer order
pub fn fixed_order_solution(
    problem: &VrpProblem,
    matrices: &DistanceTimeMatrices,
    metric: CostMetric,
    order: &[CustomerId],
) -> Result<RouteSolution> {
    if problem.stops.is_empty() {
        return Ok(RouteSolution::empty());
    }
    check_matrix_size(problem, matrices)?;
    let route = order
        .iter()
        .map(|&id| match problem.stop_index(id) {
            Some(index) => Ok(index + 1),
            None => bail!("customer {} is not a stop of this route", id),
        })
        .collect::<Result<Vec<usize>>>()?;
    if route.len() != problem.stops.len() {
        bail!("order has {} stops, route has {}", route.len(), problem.stops.len());
    }
    let cost = CostModel::new(matrices, metric, problem.return_to_depot);
    Ok(RouteSolution::from_route(problem, matrices, &cost, &route, "naive"))
}

/// Best order of at most two stops; equal cost keeps index order
fn enumerate(cost: &CostModel) -> Vec<usize> {
    match cost.stop_count() {
        0 => vec![],
        1 => vec![1],
        _ => {
            if cost.route_cost(&[2, 1]) < cost.route_cost(&[1, 2]) {
                vec![2, 1]
            } else {
                vec![1, 2]
            }
        }
    }
}

fn check_matrix_size(problem: &VrpProblem, matrices: &DistanceTimeMatrices) -> Result<()> {
    if problem.stops.len() > MAX_ROUTE_STOPS {
        bail!(
            "{} stops exceed the limit of {} per route",
            problem.stops.len(),
            MAX_ROUTE_STOPS
        );
    }
    let expected = problem.stops.len() + 1;
    if matrices.size != expected || matrices.distances.len() != expected || matrices.durations.len() != expected {
        bail!(
            "matrix size mismatch: expected {}, got {}",
            expected,
            matrices.size
        );
    }
    Ok(())
}
