//! Daily urgency score for eligible customers

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::services::window::CleaningWindow;
use crate::types::CustomerId;

/// Urgency of servicing a customer on `date`; higher is more urgent.
///
/// `max(1, 30 - days_until_due) * max(1, 30 / frequency_days)`. Overdue jobs
/// score above 30 on the first factor, and short-cycle customers weigh more.
pub fn priority(window: &CleaningWindow, date: NaiveDate) -> f64 {
    let base_urgency = (30 - window.days_until_due(date)).max(1) as f64;
    let frequency_factor = (30.0 / window.frequency_days as f64).max(1.0);
    base_urgency * frequency_factor
}

/// Descending priority, then ascending customer id
pub fn compare_candidates(a: (f64, CustomerId), b: (f64, CustomerId)) -> Ordering {
    b.0.total_cmp(&a.0).then(a.1.cmp(&b.1))
}
