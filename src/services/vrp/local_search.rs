//! Iterated local search on u-routing's improvement operators.
//!
//! Nearest-neighbour construction on the arc matrix, then descent with
//! u-routing's 2-opt and Or-opt, then seeded double-bridge kicks that each
//! restart the descent. Routes are matrix indices `1..=n`; index 0 is the
//! start.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use u_routing::distance::DistanceMatrix;
use u_routing::local_search::{or_opt_improve, two_opt_improve};

use super::problem::CostModel;

const START: usize = 0;

/// Outcome of the iterated search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub route: Vec<usize>,
    pub cost: u64,
    pub iterations: usize,
    /// The deadline stopped the search before the iteration budget ran out
    pub timed_out: bool,
}

/// Matrices handed to the u-routing operators
struct SearchSpace {
    /// Arc costs; the leg back to the start is free on an open route
    arcs: DistanceMatrix,
    /// Arc costs with stop-to-stop legs averaged over both directions.
    /// Segment reversal is scored here so its deltas stay exact on
    /// asymmetric road matrices.
    reversible: DistanceMatrix,
}

impl SearchSpace {
    fn new(cost: &CostModel) -> Self {
        let size = cost.stop_count() + 1;
        let mut arcs = DistanceMatrix::new(size);
        for from in 0..size {
            for to in 0..size {
                let free_return = to == START && !cost.is_closed();
                let arc = if free_return { 0.0 } else { cost.arc(from, to) as f64 };
                arcs.set(from, to, arc);
            }
        }

        let mut reversible = arcs.clone();
        for from in 1..size {
            for to in from + 1..size {
                let mean = (arcs.get(from, to) + arcs.get(to, from)) / 2.0;
                reversible.set(from, to, mean);
                reversible.set(to, from, mean);
            }
        }

        Self { arcs, reversible }
    }

    /// Greedy construction from the start; ties go to the lower index
    fn construct(&self) -> Vec<usize> {
        let mut remaining: Vec<usize> = (1..self.arcs.size()).collect();
        let mut route = Vec::with_capacity(remaining.len());
        let mut current = START;

        while let Some(next) = self.arcs.nearest_neighbor(current, &remaining) {
            remaining.retain(|&stop| stop != next);
            route.push(next);
            current = next;
        }

        route
    }
}

/// Nearest-neighbour route for `cost`
pub fn nearest_neighbor(cost: &CostModel) -> Vec<usize> {
    SearchSpace::new(cost).construct()
}

/// Result of one descent
#[derive(Debug, Clone, PartialEq)]
struct Descent {
    route: Vec<usize>,
    /// False when the deadline interrupted the descent
    complete: bool,
}

/// 2-opt and Or-opt until the true route cost stops falling
fn descend(
    route: Vec<usize>,
    space: &SearchSpace,
    cost: &CostModel,
    deadline: Option<Instant>,
) -> Descent {
    let mut best_cost = cost.route_cost(&route);
    let mut best = route;

    loop {
        if expired(deadline) {
            return Descent {
                route: best,
                complete: false,
            };
        }

        let (reversed, _) = two_opt_improve(&best, START, &space.reversible);
        let reversed_cost = cost.route_cost(&reversed);
        let (base, base_cost) = if reversed_cost < best_cost {
            (reversed, reversed_cost)
        } else {
            (best.clone(), best_cost)
        };

        let (moved, _) = or_opt_improve(&base, START, &space.arcs);
        let moved_cost = cost.route_cost(&moved);
        let (next, next_cost) = if moved_cost < base_cost {
            (moved, moved_cost)
        } else {
            (base, base_cost)
        };

        if next_cost >= best_cost {
            return Descent {
                route: best,
                complete: true,
            };
        }
        best = next;
        best_cost = next_cost;
    }
}

/// Cut into four parts A B C D and reconnect as A C B D
fn double_bridge(route: &[usize], rng: &mut StdRng) -> Vec<usize> {
    let n = route.len();
    if n < 4 {
        return route.to_vec();
    }
    let mut cuts = [
        rng.random_range(1..n),
        rng.random_range(1..n),
        rng.random_range(1..n),
    ];
    cuts.sort_unstable();
    let [a, b, c] = cuts;

    let mut perturbed = Vec::with_capacity(n);
    perturbed.extend_from_slice(&route[..a]);
    perturbed.extend_from_slice(&route[b..c]);
    perturbed.extend_from_slice(&route[a..b]);
    perturbed.extend_from_slice(&route[c..]);
    perturbed
}

/// Iterated local search from the nearest-neighbour route.
///
/// Runs `max_iterations` kicks. If `deadline` passes first the search is
/// abandoned and the descended construction is returned, so the route
/// depends on the seed and the budget only, never on how far the clock let
/// the search get.
pub fn iterated_local_search(
    cost: &CostModel,
    max_iterations: usize,
    seed: u64,
    deadline: Option<Instant>,
) -> SearchOutcome {
    let space = SearchSpace::new(cost);
    // Not deadline-bound; stop counts are capped
    let start = descend(space.construct(), &space, cost, None).route;
    let start_cost = cost.route_cost(&start);

    let mut best = start.clone();
    let mut best_cost = start_cost;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut iterations = 0;
    let mut timed_out = false;

    if best.len() >= 4 {
        while iterations < max_iterations {
            if expired(deadline) {
                timed_out = true;
                break;
            }

            let kicked = double_bridge(&best, &mut rng);
            let descent = descend(kicked, &space, cost, deadline);
            if !descent.complete {
                timed_out = true;
                break;
            }
            iterations += 1;

            let candidate_cost = cost.route_cost(&descent.route);
            if candidate_cost < best_cost {
                best = descent.route;
                best_cost = candidate_cost;
            }
        }
    }

    if timed_out {
        return SearchOutcome {
            route: start,
            cost: start_cost,
            iterations,
            timed_out,
        };
    }

    SearchOutcome {
        route: best,
        cost: best_cost,
        iterations,
        timed_out,
    }
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::routing::DistanceTimeMatrices;
    use crate::services::vrp::config::CostMetric;

    fn model(distances: Vec<Vec<u64>>, closed: bool) -> CostModel {
        let size = distances.len();
        let matrices = DistanceTimeMatrices {
            durations: distances.clone(),
            distances,
            size,
        };
        CostModel::new(&matrices, CostMetric::Distance, closed)
    }

    fn model_from_points(points: &[(f64, f64)], closed: bool) -> CostModel {
        let distances: Vec<Vec<u64>> = points
            .iter()
            .map(|a| {
                points
                    .iter()
                    .map(|b| (((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt() * 1000.0).round() as u64)
                    .collect()
            })
            .collect();
        model(distances, closed)
    }

    /// Start at the origin, stops scattered on a pseudo-random grid
    fn scattered(n: usize) -> Vec<(f64, f64)> {
        let mut points = vec![(0.0, 0.0)];
        for i in 0..n {
            let x = ((i * 37 + 11) % 23) as f64;
            let y = ((i * 53 + 7) % 19) as f64;
            points.push((x, y));
        }
        points
    }

    fn is_permutation(route: &[usize], n: usize) -> bool {
        let mut sorted = route.to_vec();
        sorted.sort_unstable();
        sorted == (1..=n).collect::<Vec<_>>()
    }

    fn brute_force(cost: &CostModel) -> u64 {
        fn permute(route: &mut Vec<usize>, k: usize, cost: &CostModel, best: &mut u64) {
            if k == route.len() {
                *best = (*best).min(cost.route_cost(route));
                return;
            }
            for i in k..route.len() {
                route.swap(k, i);
                permute(route, k + 1, cost, best);
                route.swap(k, i);
            }
        }
        let mut route: Vec<usize> = (1..=cost.stop_count()).collect();
        let mut best = u64::MAX;
        permute(&mut route, 0, cost, &mut best);
        best
    }

    #[test]
    fn test_nearest_neighbor_ordering() {
        let cost = model(vec![vec![0, 20, 10], vec![20, 0, 15], vec![10, 15, 0]], false);

        // Stop 2 is closer to the start, then stop 1
        assert_eq!(nearest_neighbor(&cost), vec![2, 1]);
    }

    #[test]
    fn test_nearest_neighbor_ties_go_to_lower_index() {
        let cost = model(vec![vec![0, 5, 5], vec![5, 0, 5], vec![5, 5, 0]], false);
        assert_eq!(nearest_neighbor(&cost), vec![1, 2]);
    }

    #[test]
    fn test_descend_straightens_a_line() {
        let cost = model_from_points(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0)], false);
        let space = SearchSpace::new(&cost);

        let descent = descend(vec![4, 1, 3, 2], &space, &cost, None);

        assert!(descent.complete);
        assert_eq!(descent.route, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_descend_never_worsens_asymmetric_route() {
        let cost = model(
            vec![
                vec![0, 12, 7, 30, 9, 14],
                vec![5, 0, 18, 4, 11, 6],
                vec![9, 3, 0, 21, 8, 17],
                vec![13, 22, 6, 0, 2, 10],
                vec![16, 8, 25, 12, 0, 3],
                vec![4, 19, 11, 7, 15, 0],
            ],
            false,
        );
        let space = SearchSpace::new(&cost);
        let initial = vec![5, 4, 3, 2, 1];

        let descent = descend(initial.clone(), &space, &cost, None);

        assert!(is_permutation(&descent.route, 5));
        assert!(cost.route_cost(&descent.route) <= cost.route_cost(&initial));
    }

    #[test]
    fn test_open_route_does_not_pay_the_way_back() {
        // The far stop is cheapest last on an open route
        let cost = model_from_points(&[(0.0, 0.0), (10.0, 0.0), (1.0, 0.0)], false);
        let outcome = iterated_local_search(&cost, 10, 42, None);
        assert_eq!(outcome.route, vec![2, 1]);
        assert_eq!(outcome.cost, 10_000);
    }

    #[test]
    fn test_double_bridge_keeps_every_stop() {
        let mut rng = StdRng::seed_from_u64(7);
        let route: Vec<usize> = (1..=9).collect();
        for _ in 0..20 {
            let perturbed = double_bridge(&route, &mut rng);
            assert!(is_permutation(&perturbed, 9));
        }
        assert_eq!(double_bridge(&[1, 2, 3], &mut rng), vec![1, 2, 3]);
    }

    #[test]
    fn test_search_is_deterministic_for_a_seed() {
        let cost = model_from_points(&scattered(18), false);

        let first = iterated_local_search(&cost, 200, 42, None);
        let second = iterated_local_search(&cost, 200, 42, None);

        assert_eq!(first, second);
        assert!(is_permutation(&first.route, 18));
        assert_eq!(first.iterations, 200);
        assert!(!first.timed_out);
    }

    #[test]
    fn test_search_never_worse_than_construction() {
        let cost = model_from_points(&scattered(15), true);
        let construction = cost.route_cost(&nearest_neighbor(&cost));

        let outcome = iterated_local_search(&cost, 100, 1, None);
        assert!(outcome.cost <= construction);
        assert_eq!(outcome.cost, cost.route_cost(&outcome.route));
    }

    #[test]
    fn test_search_close_to_optimum_on_small_instance() {
        let cost = model_from_points(&scattered(7), false);
        let optimum = brute_force(&cost);

        let outcome = iterated_local_search(&cost, 300, 42, None);
        assert!(outcome.cost >= optimum);
        assert!(outcome.cost * 100 <= optimum * 105);
    }

    #[test]
    fn test_expired_deadline_returns_descended_construction() {
        let cost = model_from_points(&scattered(40), false);
        let construction_only = iterated_local_search(&cost, 0, 42, None);

        let first = iterated_local_search(&cost, 1_000, 42, Some(Instant::now()));
        let second = iterated_local_search(&cost, 1_000, 7, Some(Instant::now()));

        assert!(first.timed_out);
        assert_eq!(first.iterations, 0);
        assert_eq!(first.route, construction_only.route);
        assert_eq!(second.route, first.route);
        assert!(is_permutation(&first.route, 40));
    }
}
