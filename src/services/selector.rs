//! Daily job selection
//!
//! Picks which eligible customers are serviced on one day: highest priority
//! first, first-fit against the day's remaining minutes, capped at a maximum
//! number of jobs. Packing is greedy in priority order, not optimal.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::services::priority::{compare_candidates, priority};
use crate::services::window::CleaningWindow;
use crate::types::{Customer, CustomerId};

/// Customers not yet assigned anywhere in the horizon.
///
/// Holds indices into the run's customer list. Owned by the orchestrator and
/// threaded through each day's selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerPool {
    remaining: BTreeSet<usize>,
}

impl CustomerPool {
    pub fn new(size: usize) -> Self {
        Self {
            remaining: (0..size).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.remaining.contains(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.remaining.iter().copied()
    }

    fn remove(&mut self, index: usize) {
        self.remaining.remove(&index);
    }
}

/// A customer accepted for the day, in priority order
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedJob {
    /// Index into the run's customer list
    pub index: usize,
    pub customer_id: CustomerId,
    pub priority: f64,
    pub duration_minutes: u32,
}

/// Outcome of one day's selection
#[derive(Debug, Clone, PartialEq)]
pub struct DaySelection {
    pub date: NaiveDate,
    pub selected: Vec<SelectedJob>,
    pub remaining_minutes: u32,
    /// Eligible today but left out for lack of minutes or the job cap
    pub deferred: Vec<CustomerId>,
}

impl DaySelection {
    pub fn used_minutes(&self) -> u32 {
        self.selected.iter().map(|job| job.duration_minutes).sum()
    }
}

/// Selects a day's jobs from the pool
pub struct DailyJobSelector<'a> {
    customers: &'a [Customer],
    windows: &'a [CleaningWindow],
    max_jobs_per_day: u32,
}

impl<'a> DailyJobSelector<'a> {
    pub fn new(customers: &'a [Customer], windows: &'a [CleaningWindow], max_jobs_per_day: u32) -> Self {
        Self {
            customers,
            windows,
            max_jobs_per_day,
        }
    }

    /// Choose the day's jobs and return the pool without them
    pub fn select_for_day(
        &self,
        date: NaiveDate,
        mut pool: CustomerPool,
        capacity_minutes: u32,
    ) -> (DaySelection, CustomerPool) {
        let mut candidates: Vec<(f64, CustomerId, usize)> = pool
            .iter()
            .filter(|&i| self.windows[i].covers(date))
            .map(|i| (priority(&self.windows[i], date), self.customers[i].id, i))
            .collect();
        candidates.sort_by(|a, b| compare_candidates((a.0, a.1), (b.0, b.1)));

        let mut remaining_minutes = capacity_minutes;
        let mut selected = Vec::new();
        let mut deferred = Vec::new();

        for (score, customer_id, index) in candidates {
            let duration = self.customers[index].estimated_duration_minutes;
            if selected.len() as u32 >= self.max_jobs_per_day || duration > remaining_minutes {
                deferred.push(customer_id);
                continue;
            }
            remaining_minutes -= duration;
            selected.push(SelectedJob {
                index,
                customer_id,
                priority: score,
                duration_minutes: duration,
            });
        }

        for job in &selected {
            pool.remove(job.index);
        }

        debug!(
            "{}: selected {} jobs, deferred {}, {} of {} min left",
            date,
            selected.len(),
            deferred.len(),
            remaining_minutes,
            capacity_minutes
        );

        (
            DaySelection {
                date,
                selected,
                remaining_minutes,
                deferred,
            },
            pool,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::window::calculate_windows;
    use crate::types::{Coordinates, WindowRules};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn customer(id: CustomerId, last_cleaned: NaiveDate, frequency_days: u32, minutes: u32) -> Customer {
        Customer {
            id,
            coordinates: Coordinates { lat: 51.5, lng: -0.1 },
            price: 20.0,
            estimated_duration_minutes: minutes,
            last_cleaned_date: last_cleaned,
            frequency_days,
            name: None,
            address: None,
        }
    }

    fn windows_for(customers: &[Customer], today: NaiveDate) -> Vec<CleaningWindow> {
        calculate_windows(customers, today, &WindowRules::default())
    }

    #[test]
    fn test_selects_by_priority_within_capacity() {
        let today = date(2025, 9, 15);
        let customers = vec![
            customer(1, date(2025, 9, 1), 14, 60),  // due today
            customer(2, date(2025, 8, 25), 14, 60), // 7 days overdue
            customer(3, date(2025, 9, 10), 14, 60), // due in 9 days
        ];
        let windows = windows_for(&customers, today);
        let selector = DailyJobSelector::new(&customers, &windows, 8);

        let (selection, pool) = selector.select_for_day(today, CustomerPool::new(3), 120);

        let ids: Vec<CustomerId> = selection.selected.iter().map(|j| j.customer_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(selection.remaining_minutes, 0);
        assert_eq!(selection.deferred, vec![3]);
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(2));
    }

    #[test]
    fn test_first_fit_skips_job_that_does_not_fit() {
        let today = date(2025, 9, 15);
        let customers = vec![
            customer(1, date(2025, 8, 25), 14, 90),
            customer(2, date(2025, 8, 28), 14, 90),
            customer(3, date(2025, 9, 1), 14, 30),
        ];
        let windows = windows_for(&customers, today);
        let selector = DailyJobSelector::new(&customers, &windows, 8);

        let (selection, _) = selector.select_for_day(today, CustomerPool::new(3), 120);

        let ids: Vec<CustomerId> = selection.selected.iter().map(|j| j.customer_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(selection.used_minutes(), 120);
    }

    #[test]
    fn test_max_jobs_cap() {
        let today = date(2025, 9, 15);
        let customers: Vec<Customer> = (1..=5).map(|id| customer(id, date(2025, 9, 1), 14, 10)).collect();
        let windows = windows_for(&customers, today);
        let selector = DailyJobSelector::new(&customers, &windows, 3);

        let (selection, pool) = selector.select_for_day(today, CustomerPool::new(5), 600);

        // Equal priority: lower ids first
        let ids: Vec<CustomerId> = selection.selected.iter().map(|j| j.customer_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(selection.deferred, vec![4, 5]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_ignores_customers_outside_window() {
        let today = date(2025, 9, 15);
        let customers = vec![
            customer(1, date(2025, 9, 14), 30, 30), // window opens 2025-09-30
            customer(2, date(2025, 9, 1), 14, 30),
        ];
        let windows = windows_for(&customers, today);
        let selector = DailyJobSelector::new(&customers, &windows, 8);

        let (selection, pool) = selector.select_for_day(today, CustomerPool::new(2), 480);

        assert_eq!(selection.selected.len(), 1);
        assert_eq!(selection.selected[0].customer_id, 2);
        assert!(selection.deferred.is_empty());
        assert!(pool.contains(0));
    }

    #[test]
    fn test_already_assigned_customers_are_not_reselected() {
        let today = date(2025, 9, 15);
        let customers = vec![customer(1, date(2025, 9, 1), 14, 30)];
        let windows = windows_for(&customers, today);
        let selector = DailyJobSelector::new(&customers, &windows, 8);

        let (first, pool) = selector.select_for_day(today, CustomerPool::new(1), 480);
        let (second, pool) = selector.select_for_day(today.succ_opt().unwrap(), pool, 480);

        assert_eq!(first.selected.len(), 1);
        assert!(second.selected.is_empty());
        assert!(pool.is_empty());
    }
}
