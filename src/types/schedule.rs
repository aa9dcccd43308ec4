//! Scheduling request types and ingestion checks

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::{Coordinates, Customer, CustomerInput};
use crate::defaults::{
    default_work_start, DEFAULT_HORIZON_DAYS, DEFAULT_MAX_JOBS_PER_DAY, MAX_FREQUENCY_DAYS,
    MAX_HORIZON_DAYS, MAX_JOBS_PER_DAY, WINDOW_BUFFER_DAYS,
};
use crate::error::SchedulingError;

/// Cleaner's weekly availability. `None` means a day off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkProfile {
    #[serde(default)]
    pub monday_hours: Option<f64>,
    #[serde(default)]
    pub tuesday_hours: Option<f64>,
    #[serde(default)]
    pub wednesday_hours: Option<f64>,
    #[serde(default)]
    pub thursday_hours: Option<f64>,
    #[serde(default)]
    pub friday_hours: Option<f64>,
    #[serde(default)]
    pub saturday_hours: Option<f64>,
    #[serde(default)]
    pub sunday_hours: Option<f64>,
    /// Time the first leg leaves the start location
    #[serde(default)]
    pub day_start: Option<NaiveTime>,
}

impl WorkProfile {
    /// Same hours every day of the week
    pub fn uniform(hours: f64) -> Self {
        Self {
            monday_hours: Some(hours),
            tuesday_hours: Some(hours),
            wednesday_hours: Some(hours),
            thursday_hours: Some(hours),
            friday_hours: Some(hours),
            saturday_hours: Some(hours),
            sunday_hours: Some(hours),
            day_start: None,
        }
    }

    pub fn hours_for_weekday(&self, weekday: Weekday) -> Option<f64> {
        match weekday {
            Weekday::Mon => self.monday_hours,
            Weekday::Tue => self.tuesday_hours,
            Weekday::Wed => self.wednesday_hours,
            Weekday::Thu => self.thursday_hours,
            Weekday::Fri => self.friday_hours,
            Weekday::Sat => self.saturday_hours,
            Weekday::Sun => self.sunday_hours,
        }
    }

    /// Capacity in whole minutes, `None` for a day off (missing or zero hours)
    pub fn capacity_minutes(&self, date: NaiveDate) -> Option<u32> {
        match self.hours_for_weekday(date.weekday()) {
            Some(hours) if hours > 0.0 => Some((hours * 60.0).round() as u32),
            _ => None,
        }
    }

    pub fn day_start(&self) -> NaiveTime {
        self.day_start.unwrap_or_else(default_work_start)
    }

    fn validate(&self) -> Result<(), String> {
        let days = [
            ("monday_hours", self.monday_hours),
            ("tuesday_hours", self.tuesday_hours),
            ("wednesday_hours", self.wednesday_hours),
            ("thursday_hours", self.thursday_hours),
            ("friday_hours", self.friday_hours),
            ("saturday_hours", self.saturday_hours),
            ("sunday_hours", self.sunday_hours),
        ];
        for (field, hours) in days {
            if let Some(hours) = hours {
                if !hours.is_finite() || !(0.0..=24.0).contains(&hours) {
                    return Err(format!("{} must be between 0 and 24, got {}", field, hours));
                }
            }
        }
        Ok(())
    }
}

/// A scheduling request as supplied by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub customers: Vec<CustomerInput>,
    #[serde(default)]
    pub work_profile: WorkProfile,
    #[serde(default)]
    pub start_location: Option<Coordinates>,
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    #[serde(default = "default_max_jobs_per_day")]
    pub max_jobs_per_day: u32,
    #[serde(default)]
    pub min_gap_days: Option<u32>,
    #[serde(default)]
    pub max_gap_days: Option<u32>,
    /// First day of the horizon; the local date when omitted
    #[serde(default)]
    pub today: Option<NaiveDate>,
    /// Leading horizon days that are kept free of new visits
    #[serde(default)]
    pub frozen_days: u32,
    /// Close each day's route back at the start location
    #[serde(default)]
    pub return_to_start: bool,
}

fn default_horizon_days() -> u32 {
    DEFAULT_HORIZON_DAYS
}

fn default_max_jobs_per_day() -> u32 {
    DEFAULT_MAX_JOBS_PER_DAY
}

/// Rules for deriving a cleaning window from the last visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRules {
    pub buffer_days: i64,
    pub min_gap_days: Option<u32>,
    pub max_gap_days: Option<u32>,
}

impl Default for WindowRules {
    fn default() -> Self {
        Self {
            buffer_days: WINDOW_BUFFER_DAYS,
            min_gap_days: None,
            max_gap_days: None,
        }
    }
}

/// Request that passed ingestion checks; customers sorted by id
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub customers: Vec<Customer>,
    pub work_profile: WorkProfile,
    pub start_location: Option<Coordinates>,
    pub horizon_start: NaiveDate,
    pub horizon_days: u32,
    pub max_jobs_per_day: u32,
    pub window_rules: WindowRules,
    pub frozen_days: u32,
    pub return_to_start: bool,
}

impl ValidatedRequest {
    pub fn horizon_end(&self) -> NaiveDate {
        self.horizon_start + chrono::Duration::days(self.horizon_days as i64 - 1)
    }
}

impl ScheduleRequest {
    /// Reject malformed input before any day is processed
    pub fn validate(self, fallback_today: NaiveDate) -> Result<ValidatedRequest, SchedulingError> {
        let invalid = SchedulingError::InvalidRequest;

        if self.horizon_days == 0 || self.horizon_days > MAX_HORIZON_DAYS {
            return Err(invalid(format!(
                "horizon_days must be between 1 and {}, got {}",
                MAX_HORIZON_DAYS, self.horizon_days
            )));
        }
        if self.max_jobs_per_day == 0 || self.max_jobs_per_day > MAX_JOBS_PER_DAY {
            return Err(invalid(format!(
                "max_jobs_per_day must be between 1 and {}, got {}",
                MAX_JOBS_PER_DAY, self.max_jobs_per_day
            )));
        }
        for (field, gap) in [("min_gap_days", self.min_gap_days), ("max_gap_days", self.max_gap_days)] {
            if let Some(days) = gap.filter(|days| *days > MAX_FREQUENCY_DAYS) {
                return Err(invalid(format!(
                    "{} must be at most {}, got {}",
                    field, MAX_FREQUENCY_DAYS, days
                )));
            }
        }
        if let (Some(min_gap), Some(max_gap)) = (self.min_gap_days, self.max_gap_days) {
            if min_gap > max_gap {
                return Err(invalid(format!(
                    "min_gap_days ({}) must not exceed max_gap_days ({})",
                    min_gap, max_gap
                )));
            }
        }
        self.work_profile.validate().map_err(invalid)?;
        let horizon_start = self.today.unwrap_or(fallback_today);
        if horizon_start
            .checked_add_signed(chrono::Duration::days(self.horizon_days as i64))
            .is_none()
        {
            return Err(invalid(format!("horizon starting {} is out of range", horizon_start)));
        }
        if let Some(start) = &self.start_location {
            if !start.is_valid() {
                return Err(invalid(format!(
                    "invalid start_location ({}, {})",
                    start.lat, start.lng
                )));
            }
        }

        let mut seen = HashSet::with_capacity(self.customers.len());
        let mut customers = Vec::with_capacity(self.customers.len());
        for input in self.customers {
            if !seen.insert(input.id) {
                return Err(invalid(format!("duplicate customer id {}", input.id)));
            }
            customers.push(input.into_customer().map_err(invalid)?);
        }
        customers.sort_by_key(|c| c.id);

        Ok(ValidatedRequest {
            customers,
            work_profile: self.work_profile,
            start_location: self.start_location,
            horizon_start,
            horizon_days: self.horizon_days,
            max_jobs_per_day: self.max_jobs_per_day,
            window_rules: WindowRules {
                buffer_days: WINDOW_BUFFER_DAYS,
                min_gap_days: self.min_gap_days,
                max_gap_days: self.max_gap_days,
            },
            frozen_days: self.frozen_days,
            return_to_start: self.return_to_start,
        })
    }
}
