//! Sequential timing of an ordered route.
//!
//! Given an ordered list of stops, the start location and a distance/time
//! matrix, walks the route and computes arrival/departure times for each
//! stop. It does NOT re-optimise the order; it is used both for the
//! optimized route and for the naive baseline it is compared against.

use chrono::{NaiveTime, Timelike};

/// Input for sequential schedule computation.
#[derive(Debug, Clone)]
pub struct ScheduleInput {
    /// Index of the start location in the matrix (0 by convention).
    pub depot_matrix_idx: usize,
    /// Service duration of each stop, in visiting order.
    pub service_minutes: Vec<u32>,
    /// Matrix indices for each stop (parallel to `service_minutes`).
    pub stop_matrix_indices: Vec<usize>,
    /// Departure from the start location.
    pub workday_start: NaiveTime,
    /// Include the leg from the last stop back to the start.
    pub return_to_depot: bool,
}

/// Result of the sequential schedule computation.
#[derive(Debug, Clone, PartialEq)]
pub struct SequentialSchedule {
    /// Per-stop computed schedule (parallel to input stops).
    pub stops: Vec<ComputedStopSchedule>,
    /// Travel distance from last stop back to start (km), 0 for open routes.
    pub return_distance_km: f64,
    /// Travel duration from last stop back to start (minutes).
    pub return_duration_minutes: u32,
    /// Total route distance in meters, including any return leg.
    pub total_distance_meters: u64,
    /// Total travel seconds (NOT including service time).
    pub total_travel_seconds: u64,
    /// Total service time (minutes).
    pub total_service_minutes: u32,
}

/// Computed arrival/departure for a single stop.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStopSchedule {
    pub estimated_arrival: NaiveTime,
    pub estimated_departure: NaiveTime,
    pub distance_from_previous_km: f64,
    pub duration_from_previous_minutes: u32,
    pub service_duration_minutes: u32,
}

fn add_minutes(time: NaiveTime, minutes: u32) -> NaiveTime {
    let total_secs = time.num_seconds_from_midnight() as i64 + minutes as i64 * 60;
    let clamped = total_secs.clamp(0, 24 * 60 * 60 - 1) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(clamped, 0).unwrap_or(time)
}

fn seconds_to_minutes(seconds: u64) -> u32 {
    (seconds as f64 / 60.0).ceil() as u32
}

/// Compute a sequential schedule for the given route.
///
/// Distances are in **meters**, durations in **seconds**, matching
/// `DistanceTimeMatrices` from `routing`. Times past midnight clamp to 23:59:59.
pub fn compute_sequential_schedule(
    input: &ScheduleInput,
    distance_matrix: &[Vec<u64>],
    duration_matrix: &[Vec<u64>],
) -> SequentialSchedule {
    let n = input.stop_matrix_indices.len();
    let mut result_stops: Vec<ComputedStopSchedule> = Vec::with_capacity(n);

    let mut cursor = input.workday_start;
    let mut total_distance_m: u64 = 0;
    let mut total_travel_seconds: u64 = 0;
    let mut total_service_min: u32 = 0;

    let mut prev_matrix_idx = input.depot_matrix_idx;

    for (i, &stop_mx) in input.stop_matrix_indices.iter().enumerate() {
        let travel_dist_m = distance_matrix[prev_matrix_idx][stop_mx];
        let travel_dur_s = duration_matrix[prev_matrix_idx][stop_mx];
        let travel_min = seconds_to_minutes(travel_dur_s);

        let arrival = add_minutes(cursor, travel_min);
        let service_min = input.service_minutes.get(i).copied().unwrap_or(0);
        let departure = add_minutes(arrival, service_min);

        result_stops.push(ComputedStopSchedule {
            estimated_arrival: arrival,
            estimated_departure: departure,
            distance_from_previous_km: travel_dist_m as f64 / 1000.0,
            duration_from_previous_minutes: travel_min,
            service_duration_minutes: service_min,
        });

        total_distance_m += travel_dist_m;
        total_travel_seconds += travel_dur_s;
        total_service_min += service_min;
        cursor = departure;
        prev_matrix_idx = stop_mx;
    }

    let (return_dist_m, return_dur_s) = if n > 0 && input.return_to_depot {
        (
            distance_matrix[prev_matrix_idx][input.depot_matrix_idx],
            duration_matrix[prev_matrix_idx][input.depot_matrix_idx],
        )
    } else {
        (0, 0)
    };

    total_distance_m += return_dist_m;
    total_travel_seconds += return_dur_s;

    SequentialSchedule {
        stops: result_stops,
        return_distance_km: return_dist_m as f64 / 1000.0,
        return_duration_minutes: seconds_to_minutes(return_dur_s),
        total_distance_meters: total_distance_m,
        total_travel_seconds,
        total_service_minutes: total_service_min,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    /// Travel between any two different locations takes `dist_m` metres / `dur_s` seconds.
    fn uniform_matrix(size: usize, dist_m: u64, dur_s: u64) -> (Vec<Vec<u64>>, Vec<Vec<u64>>) {
        let mut d = vec![vec![0u64; size]; size];
        let mut t = vec![vec![0u64; size]; size];
        for i in 0..size {
            for j in 0..size {
                if i != j {
                    d[i][j] = dist_m;
                    t[i][j] = dur_s;
                }
            }
        }
        (d, t)
    }

    #[test]
    fn empty_route_returns_zeros() {
        let input = ScheduleInput {
            depot_matrix_idx: 0,
            service_minutes: vec![],
            stop_matrix_indices: vec![],
            workday_start: hm(9, 0),
            return_to_depot: true,
        };
        let (dm, tm) = uniform_matrix(1, 10_000, 600);
        let result = compute_sequential_schedule(&input, &dm, &tm);

        assert!(result.stops.is_empty());
        assert_eq!(result.total_distance_meters, 0);
        assert_eq!(result.total_travel_seconds, 0);
        assert_eq!(result.total_service_minutes, 0);
    }

    #[test]
    fn single_stop_open_route() {
        let (dm, tm) = uniform_matrix(2, 10_000, 900);
        let input = ScheduleInput {
            depot_matrix_idx: 0,
            service_minutes: vec![45],
            stop_matrix_indices: vec![1],
            workday_start: hm(9, 0),
            return_to_depot: false,
        };

        let result = compute_sequential_schedule(&input, &dm, &tm);

        let s = &result.stops[0];
        assert_eq!(s.estimated_arrival, hm(9, 15));
        assert_eq!(s.estimated_departure, hm(10, 0));
        assert_eq!(s.distance_from_previous_km, 10.0);
        assert_eq!(s.duration_from_previous_minutes, 15);
        assert_eq!(result.return_distance_km, 0.0);
        assert_eq!(result.total_distance_meters, 10_000);
        assert_eq!(result.total_travel_seconds, 900);
    }

    #[test]
    fn single_stop_with_return_leg() {
        let (dm, tm) = uniform_matrix(2, 10_000, 900);
        let input = ScheduleInput {
            depot_matrix_idx: 0,
            service_minutes: vec![60],
            stop_matrix_indices: vec![1],
            workday_start: hm(8, 0),
            return_to_depot: true,
        };

        let result = compute_sequential_schedule(&input, &dm, &tm);

        assert_eq!(result.return_distance_km, 10.0);
        assert_eq!(result.return_duration_minutes, 15);
        assert_eq!(result.total_distance_meters, 20_000);
        assert_eq!(result.total_travel_seconds, 1_800);
        assert_eq!(result.total_service_minutes, 60);
    }

    #[test]
    fn two_stops_chain_departure_into_next_arrival() {
        let (dm, tm) = uniform_matrix(3, 5_000, 600);
        let input = ScheduleInput {
            depot_matrix_idx: 0,
            service_minutes: vec![30, 30],
            stop_matrix_indices: vec![2, 1],
            workday_start: hm(9, 0),
            return_to_depot: false,
        };

        let result = compute_sequential_schedule(&input, &dm, &tm);

        assert_eq!(result.stops[0].estimated_arrival, hm(9, 10));
        assert_eq!(result.stops[0].estimated_departure, hm(9, 40));
        assert_eq!(result.stops[1].estimated_arrival, hm(9, 50));
        assert_eq!(result.stops[1].estimated_departure, hm(10, 20));
        assert_eq!(result.total_service_minutes, 60);
    }

    #[test]
    fn partial_minutes_round_up() {
        let (dm, tm) = uniform_matrix(2, 1_000, 61);
        let input = ScheduleInput {
            depot_matrix_idx: 0,
            service_minutes: vec![30],
            stop_matrix_indices: vec![1],
            workday_start: hm(9, 0),
            return_to_depot: false,
        };

        let result = compute_sequential_schedule(&input, &dm, &tm);
        assert_eq!(result.stops[0].duration_from_previous_minutes, 2);
        assert_eq!(result.stops[0].estimated_arrival, hm(9, 2));
    }

    #[test]
    fn late_route_clamps_before_midnight() {
        let (dm, tm) = uniform_matrix(2, 1_000, 600);
        let input = ScheduleInput {
            depot_matrix_idx: 0,
            service_minutes: vec![120],
            stop_matrix_indices: vec![1],
            workday_start: hm(23, 0),
            return_to_depot: false,
        };

        let result = compute_sequential_schedule(&input, &dm, &tm);
        assert_eq!(
            result.stops[0].estimated_departure,
            NaiveTime::from_hms_opt(23, 59, 59).unwrap()
        );
    }
}
