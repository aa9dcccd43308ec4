//! Cleaning window calculation
//!
//! A customer is due `frequency_days` after the last clean and may be visited
//! up to `buffer_days` either side of that date.

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::Serialize;

use crate::types::{Customer, WindowRules};

/// Feasible service dates for one customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleaningWindow {
    pub due_date: NaiveDate,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub frequency_days: u32,
}

impl CleaningWindow {
    /// Negative for overdue jobs
    pub fn days_until_due(&self, date: NaiveDate) -> i64 {
        (self.due_date - date).num_days()
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.window_start <= date && date <= self.window_end
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.window_start <= end && start <= self.window_end
    }
}

/// Derive the cleaning window from the last clean date.
///
/// `today` is accepted for symmetry with the scorer; the window itself only
/// depends on the customer's history.
pub fn calculate_window(
    last_cleaned: NaiveDate,
    frequency_days: u32,
    _today: NaiveDate,
    rules: &WindowRules,
) -> CleaningWindow {
    let due_date = shift(last_cleaned, frequency_days as i64);
    let mut window_start = shift(due_date, -rules.buffer_days);
    let mut window_end = shift(due_date, rules.buffer_days);

    if let Some(min_gap) = rules.min_gap_days {
        window_start = window_start.max(shift(last_cleaned, min_gap as i64));
    }
    if let Some(max_gap) = rules.max_gap_days {
        window_end = window_end.min(shift(last_cleaned, max_gap as i64));
    }

    CleaningWindow {
        due_date,
        window_start: window_start.min(due_date),
        window_end: window_end.max(due_date),
        frequency_days,
    }
}

/// Move `date` by `days`, saturating at the ends of the calendar
fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// Windows for every customer, computed in parallel, in input order
pub fn calculate_windows(
    customers: &[Customer],
    today: NaiveDate,
    rules: &WindowRules,
) -> Vec<CleaningWindow> {
    customers
        .par_iter()
        .map(|c| calculate_window(c.last_cleaned_date, c.frequency_days, today, rules))
        .collect()
}
