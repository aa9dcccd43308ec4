//! Schedule result and its wire shape

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::{CustomerId, DaySlot, TimeSavings};

/// Why a customer did not receive a visit in the horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnscheduledReason {
    /// Window covered working days, but hours or the daily cap ran out
    InsufficientCapacity,
    /// Window lies entirely before or after the horizon
    OutsideHorizon,
    /// Window overlaps the horizon only on days off or frozen days
    NoWorkingDay,
}

/// Customer left out of the schedule, with a window coverage diagnostic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnscheduledCustomer {
    pub id: CustomerId,
    pub reason: UnscheduledReason,
    pub due_date: NaiveDate,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    /// Working days of the horizon that fell inside the window
    pub eligible_working_days: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScheduleSummary {
    pub total_customers_scheduled: u32,
    pub total_revenue: f64,
    pub total_work_hours: f64,
    /// Days with at least one visit
    pub working_days: u32,
    pub total_travel_minutes: u32,
    pub time_savings: TimeSavings,
}

/// Full outcome of one scheduling run; built once, never mutated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleResult {
    pub horizon_start: NaiveDate,
    pub horizon_end: NaiveDate,
    pub days: Vec<DaySlot>,
    pub unscheduled: Vec<UnscheduledCustomer>,
    pub summary: ScheduleSummary,
}

/// Response body: day plans keyed by ISO date
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleResponse {
    pub schedule: BTreeMap<String, DaySlot>,
    pub summary: ScheduleSummary,
    pub unscheduled_customers: Vec<UnscheduledCustomer>,
}

impl From<ScheduleResult> for ScheduleResponse {
    fn from(result: ScheduleResult) -> Self {
        let schedule = result
            .days
            .into_iter()
            .map(|day| (day.date.format("%Y-%m-%d").to_string(), day))
            .collect();

        Self {
            schedule,
            summary: result.summary,
            unscheduled_customers: result.unscheduled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DayStatus;

    #[test]
    fn test_reason_serialization() {
        let value = serde_json::to_value(UnscheduledReason::InsufficientCapacity).unwrap();
        assert_eq!(value, "insufficient_capacity");
        let value = serde_json::to_value(UnscheduledReason::NoWorkingDay).unwrap();
        assert_eq!(value, "no_working_day");
    }

    #[test]
    fn test_response_keys_days_by_date() {
        let start = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();
        let next = start.succ_opt().unwrap();
        let result = ScheduleResult {
            horizon_start: start,
            horizon_end: next,
            days: vec![
                DaySlot::empty(start, DayStatus::Working, 480),
                DaySlot::empty(next, DayStatus::DayOff, 0),
            ],
            unscheduled: Vec::new(),
            summary: ScheduleSummary::default(),
        };

        let response = ScheduleResponse::from(result);
        let keys: Vec<&String> = response.schedule.keys().collect();
        assert_eq!(keys, vec!["2025-09-15", "2025-09-16"]);
        assert!(response.unscheduled_customers.is_empty());
    }
}
