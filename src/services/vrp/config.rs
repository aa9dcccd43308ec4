//! Route solver configuration

use serde::{Deserialize, Serialize};

/// Largest stop count one solve accepts
pub const MAX_ROUTE_STOPS: usize = 200;

/// Move evaluations the search may spend per solve, about `iterations * n²`
pub const SEARCH_WORK_BUDGET: usize = 10_000_000;

/// What the solver minimizes along the route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostMetric {
    /// Road distance in meters
    Distance,
    /// Travel time in seconds
    Duration,
}

/// Configuration for the route solver
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Soft budget for one day's search in milliseconds
    pub time_limit_ms: u64,
    /// Perturbation rounds of the iterated local search
    pub max_iterations: usize,
    /// Seed for the perturbation RNG
    pub seed: u64,
    pub cost_metric: CostMetric,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 2_000,
            max_iterations: 2_000,
            seed: 42,
            cost_metric: CostMetric::Distance,
        }
    }
}

impl SolverConfig {
    /// Create config with custom budget values
    pub fn new(time_limit_ms: u64, max_iterations: usize) -> Self {
        Self {
            time_limit_ms,
            max_iterations,
            ..Default::default()
        }
    }

    /// Fast configuration for interactive use
    pub fn fast() -> Self {
        Self::new(500, 500)
    }

    /// Minimal search, may not find the best route
    pub fn instant() -> Self {
        Self::new(100, 100)
    }

    /// Perturbation rounds for a route of `stops` stops.
    ///
    /// Depends only on the stop count and the config, never on the clock.
    pub fn iteration_budget(&self, stops: usize) -> usize {
        let per_round = stops.max(1).saturating_mul(stops.max(1));
        (SEARCH_WORK_BUDGET / per_round).clamp(1, self.max_iterations.max(1))
    }

    /// Wall-clock limit after which the worker is abandoned.
    ///
    /// The search itself stops at `time_limit_ms`; the grace period covers
    /// scheduling delay of the blocking thread.
    pub fn hard_timeout_ms(&self) -> u64 {
        self.time_limit_ms + (self.time_limit_ms / 2).max(250)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert_eq!(config.time_limit_ms, 2_000);
        assert_eq!(config.max_iterations, 2_000);
        assert_eq!(config.seed, 42);
        assert_eq!(config.cost_metric, CostMetric::Distance);
    }

    #[test]
    fn test_presets_are_ordered() {
        assert!(SolverConfig::instant().time_limit_ms < SolverConfig::fast().time_limit_ms);
        assert!(SolverConfig::fast().max_iterations < SolverConfig::default().max_iterations);
    }

    #[test]
    fn test_iteration_budget_shrinks_with_route_size() {
        let config = SolverConfig::default();
        assert_eq!(config.iteration_budget(8), 2_000);
        assert_eq!(config.iteration_budget(50), 2_000);
        assert_eq!(config.iteration_budget(100), 1_000);
        assert_eq!(config.iteration_budget(MAX_ROUTE_STOPS), 250);
        assert_eq!(SolverConfig::new(100, 0).iteration_budget(5), 1);
    }

    #[test]
    fn test_hard_timeout_exceeds_soft_limit() {
        assert_eq!(SolverConfig::instant().hard_timeout_ms(), 350);
        assert_eq!(SolverConfig::default().hard_timeout_ms(), 3_000);
    }
}
