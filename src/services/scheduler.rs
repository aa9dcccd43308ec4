//! Multi-day schedule orchestration
//!
//! Walks the horizon one day at a time. Each working day takes the most
//! urgent eligible customers that fit its hours, orders them into a route and
//! removes them from the pool. Whatever is left in the pool at the end is
//! reported as unscheduled with a reason.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::defaults::{default_work_start, DEFAULT_SERVICE_DURATION_MINUTES};
use crate::error::SchedulingError;
use crate::services::geo::GeoEstimator;
use crate::services::routing::{matrices_or_estimate, GeoRoutingService, RoutingService};
use crate::services::savings::{self, FuelModel};
use crate::services::selector::{CustomerPool, DailyJobSelector, DaySelection, SelectedJob};
use crate::services::vrp::{
    fixed_order_solution, Depot, RouteOptimizer, RouteSolution, RouteWarning, VrpProblem, VrpStop,
    MAX_ROUTE_STOPS,
};
use crate::services::window::{calculate_windows, CleaningWindow};
use crate::types::route::round2;
use crate::types::{
    Coordinates, CustomerId, DaySlot, DayStatus, RouteRequest, RouteResponse, RouteStopOrder,
    ScheduleRequest, ScheduleResult, ScheduleSummary, TimeSavings, UnscheduledCustomer,
    UnscheduledReason, ValidatedRequest, Visit,
};

/// Builds multi-day schedules; holds no per-run state
#[derive(Clone)]
pub struct Scheduler {
    routing: Arc<dyn RoutingService>,
    estimator: GeoEstimator,
    optimizer: RouteOptimizer,
    fuel: FuelModel,
}

impl Scheduler {
    pub fn new(
        routing: Arc<dyn RoutingService>,
        estimator: GeoEstimator,
        optimizer: RouteOptimizer,
        fuel: FuelModel,
    ) -> Self {
        Self {
            routing,
            estimator,
            optimizer,
            fuel,
        }
    }

    /// Straight-line distances and default solver settings
    pub fn with_defaults() -> Self {
        let estimator = GeoEstimator::default();
        Self::new(
            Arc::new(GeoRoutingService::new(estimator)),
            estimator,
            RouteOptimizer::default(),
            FuelModel::default(),
        )
    }

    /// Validate the request and plan its horizon
    pub async fn run(&self, request: ScheduleRequest) -> Result<ScheduleResult, SchedulingError> {
        let request = request.validate(Local::now().date_naive())?;
        self.plan(&request).await
    }

    /// Plan an already validated request
    pub async fn plan(&self, request: &ValidatedRequest) -> Result<ScheduleResult, SchedulingError> {
        let horizon_start = request.horizon_start;
        let horizon_end = request.horizon_end();

        info!(
            "Scheduling {} customers over {} days ({} to {}), routing via {}",
            request.customers.len(),
            request.horizon_days,
            horizon_start,
            horizon_end,
            self.routing.name()
        );

        if !request.customers.is_empty() {
            self.routing.check_available().await.map_err(|err| {
                SchedulingError::SolverUnavailable(format!("{}: {:#}", self.routing.name(), err))
            })?;
        }

        let windows = calculate_windows(&request.customers, horizon_start, &request.window_rules);
        let selector =
            DailyJobSelector::new(&request.customers, &windows, request.max_jobs_per_day);

        let mut pool = CustomerPool::new(request.customers.len());
        let mut days = Vec::with_capacity(request.horizon_days as usize);

        for offset in 0..request.horizon_days {
            let date = horizon_start + Duration::days(offset as i64);
            let capacity = request.work_profile.capacity_minutes(date);

            if offset < request.frozen_days {
                days.push(
                    DaySlot::empty(date, DayStatus::Frozen, capacity.unwrap_or(0))
                        .with_message("Frozen: no new visits"),
                );
                continue;
            }

            let Some(capacity_minutes) = capacity else {
                days.push(DaySlot::empty(date, DayStatus::DayOff, 0).with_message("No work hours"));
                continue;
            };

            let (selection, remaining) = selector.select_for_day(date, pool, capacity_minutes);
            pool = remaining;

            if selection.selected.is_empty() {
                days.push(
                    DaySlot::empty(date, DayStatus::Working, capacity_minutes)
                        .with_message("No eligible customers"),
                );
                continue;
            }

            let slot = self.plan_day(request, &selection, capacity_minutes).await;
            info!(
                "{} ({}): {} visits, {} service min, {} travel min, {} of {} min left",
                slot.date,
                slot.day,
                slot.visits.len(),
                slot.total_service_minutes,
                slot.estimated_travel_time_minutes,
                slot.remaining_minutes,
                slot.capacity_minutes
            );
            days.push(slot);
        }

        let unscheduled = classify_unscheduled(request, &windows, &pool, &days);
        let summary = summarize(&days);

        info!(
            "Schedule complete: {} scheduled, {} unscheduled, {} working days, revenue {:.2}",
            summary.total_customers_scheduled,
            unscheduled.len(),
            summary.working_days,
            summary.total_revenue
        );

        Ok(ScheduleResult {
            horizon_start,
            horizon_end,
            days,
            unscheduled,
            summary,
        })
    }

    /// Route one day's selection and turn it into a day slot
    async fn plan_day(
        &self,
        request: &ValidatedRequest,
        selection: &DaySelection,
        capacity_minutes: u32,
    ) -> DaySlot {
        let stops = selection
            .selected
            .iter()
            .map(|job| VrpStop::from_customer(&request.customers[job.index]))
            .collect();
        let problem = VrpProblem::new(
            Depot {
                coordinates: request.start_location,
            },
            stops,
            request.work_profile.day_start(),
            request.return_to_start,
        );

        let (matrices, matrix_warning) =
            matrices_or_estimate(self.routing.as_ref(), &self.estimator, &problem.locations()).await;
        let matrices = problem.prepare_matrices(matrices);

        let mut solution = self.optimizer.optimize(&problem, &matrices).await;

        let selection_order: Vec<CustomerId> =
            selection.selected.iter().map(|job| job.customer_id).collect();
        let time_savings = match fixed_order_solution(
            &problem,
            &matrices,
            self.optimizer.config().cost_metric,
            &selection_order,
        ) {
            Ok(naive) => {
                if naive.cost < solution.cost {
                    debug!(
                        "{}: selection order beats {} ({} < {}), keeping it",
                        selection.date, solution.algorithm, naive.cost, solution.cost
                    );
                    let mut warnings = std::mem::take(&mut solution.warnings);
                    warnings.push(RouteWarning::new(
                        "NAIVE_ORDER_KEPT",
                        "optimized route was not shorter than the selection order",
                    ));
                    solution = RouteSolution { warnings, ..naive.clone() };
                }
                savings::compare(&naive, &solution, &self.fuel)
            }
            Err(err) => {
                warn!("{}: could not evaluate selection order: {:#}", selection.date, err);
                TimeSavings::default()
            }
        };

        let mut warnings: Vec<String> = matrix_warning.into_iter().collect();
        warnings.extend(solution.warnings.iter().map(|w| w.message.clone()));

        build_day_slot(
            request,
            selection,
            capacity_minutes,
            &solution,
            time_savings,
            warnings,
        )
    }

    /// Order an arbitrary stop list with the route optimizer
    pub async fn route(&self, request: RouteRequest) -> Result<RouteResponse, SchedulingError> {
        if request.customers.is_empty() {
            return Err(SchedulingError::NoCustomers);
        }
        if request.customers.len() > MAX_ROUTE_STOPS {
            return Err(SchedulingError::InvalidRequest(format!(
                "at most {} customers per route, got {}",
                MAX_ROUTE_STOPS,
                request.customers.len()
            )));
        }
        if let Some(start) = &request.start_location {
            if !start.is_valid() {
                return Err(SchedulingError::InvalidRequest(format!(
                    "invalid start_location ({}, {})",
                    start.lat, start.lng
                )));
            }
        }

        let mut seen = HashSet::new();
        let mut stops = Vec::with_capacity(request.customers.len());
        for input in &request.customers {
            let coordinates = Coordinates::new(input.lat, input.lng);
            if !coordinates.is_valid() {
                return Err(SchedulingError::InvalidRequest(format!(
                    "customer {}: invalid coordinates ({}, {})",
                    input.id, input.lat, input.lng
                )));
            }
            if !seen.insert(input.id) {
                return Err(SchedulingError::InvalidRequest(format!(
                    "duplicate customer id {}",
                    input.id
                )));
            }
            stops.push(VrpStop {
                customer_id: input.id,
                coordinates,
                service_duration_minutes: input
                    .estimated_duration_minutes
                    .unwrap_or(DEFAULT_SERVICE_DURATION_MINUTES),
            });
        }

        self.routing.check_available().await.map_err(|err| {
            SchedulingError::SolverUnavailable(format!("{}: {:#}", self.routing.name(), err))
        })?;

        let problem = VrpProblem::new(
            Depot {
                coordinates: request.start_location,
            },
            stops,
            request.day_start.unwrap_or_else(default_work_start),
            request.return_to_start,
        );
        let (matrices, matrix_warning) =
            matrices_or_estimate(self.routing.as_ref(), &self.estimator, &problem.locations()).await;
        let matrices = problem.prepare_matrices(matrices);
        let solution = self.optimizer.optimize(&problem, &matrices).await;

        let mut warnings: Vec<String> = matrix_warning.into_iter().collect();
        warnings.extend(solution.warnings.iter().map(|w| w.message.clone()));

        Ok(RouteResponse {
            schedule: solution
                .stops
                .iter()
                .map(|stop| RouteStopOrder {
                    customer_id: stop.customer_id,
                    order: stop.order,
                    arrival_time: stop.arrival_time,
                    departure_time: stop.departure_time,
                })
                .collect(),
            total_distance_km: round2(solution.total_distance_km()),
            total_travel_minutes: solution.total_travel_minutes(),
            algorithm: solution.algorithm.clone(),
            warnings,
        })
    }
}

fn build_day_slot(
    request: &ValidatedRequest,
    selection: &DaySelection,
    capacity_minutes: u32,
    solution: &RouteSolution,
    time_savings: TimeSavings,
    warnings: Vec<String>,
) -> DaySlot {
    let jobs: HashMap<CustomerId, &SelectedJob> = selection
        .selected
        .iter()
        .map(|job| (job.customer_id, job))
        .collect();

    let visits: Vec<Visit> = solution
        .stops
        .iter()
        .filter_map(|stop| {
            let job = jobs.get(&stop.customer_id)?;
            let customer = &request.customers[job.index];
            Some(Visit {
                customer_id: customer.id,
                name: customer.name.clone(),
                address: customer.address.clone(),
                date: selection.date,
                route_order: stop.order,
                arrival_time: stop.arrival_time,
                departure_time: stop.departure_time,
                estimated_duration_minutes: customer.estimated_duration_minutes,
                price: customer.price,
                priority: round2(job.priority),
                travel_minutes_from_previous: stop.travel_minutes_from_previous,
                distance_km_from_previous: round2(stop.distance_km_from_previous),
            })
        })
        .collect();

    let total_service_minutes = selection.used_minutes();
    let travel_minutes = solution.total_travel_minutes();
    let total_revenue: f64 = visits.iter().map(|visit| visit.price).sum();

    DaySlot {
        date: selection.date,
        day: selection.date.format("%A").to_string(),
        status: DayStatus::Working,
        capacity_minutes,
        remaining_minutes: selection.remaining_minutes,
        visits,
        total_duration_minutes: total_service_minutes + travel_minutes,
        total_service_minutes,
        total_revenue: round2(total_revenue),
        estimated_travel_time_minutes: travel_minutes,
        travel_distance_km: round2(solution.total_distance_km()),
        time_savings,
        algorithm: Some(solution.algorithm.clone()),
        warnings,
        message: None,
    }
}

/// Reason for every customer still in the pool after the horizon
fn classify_unscheduled(
    request: &ValidatedRequest,
    windows: &[CleaningWindow],
    pool: &CustomerPool,
    days: &[DaySlot],
) -> Vec<UnscheduledCustomer> {
    let horizon_start = request.horizon_start;
    let horizon_end = request.horizon_end();
    let working_dates: Vec<NaiveDate> = days
        .iter()
        .filter(|day| day.status == DayStatus::Working)
        .map(|day| day.date)
        .collect();

    pool.iter()
        .map(|index| {
            let window = &windows[index];
            let eligible_working_days =
                working_dates.iter().filter(|&&date| window.covers(date)).count() as u32;
            let reason = if !window.overlaps(horizon_start, horizon_end) {
                UnscheduledReason::OutsideHorizon
            } else if eligible_working_days == 0 {
                UnscheduledReason::NoWorkingDay
            } else {
                UnscheduledReason::InsufficientCapacity
            };
            UnscheduledCustomer {
                id: request.customers[index].id,
                reason,
                due_date: window.due_date,
                window_start: window.window_start,
                window_end: window.window_end,
                eligible_working_days,
            }
        })
        .collect()
}

fn summarize(days: &[DaySlot]) -> ScheduleSummary {
    let visited: Vec<&DaySlot> = days.iter().filter(|day| !day.visits.is_empty()).collect();
    let total_minutes: u32 = visited.iter().map(|day| day.total_duration_minutes).sum();

    ScheduleSummary {
        total_customers_scheduled: visited.iter().map(|day| day.visits.len() as u32).sum(),
        total_revenue: round2(visited.iter().map(|day| day.total_revenue).sum()),
        total_work_hours: round2(total_minutes as f64 / 60.0),
        working_days: visited.len() as u32,
        total_travel_minutes: visited.iter().map(|day| day.estimated_travel_time_minutes).sum(),
        time_savings: TimeSavings::accumulate(visited.iter().map(|day| &day.time_savings)),
    }
}
