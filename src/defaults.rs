use chrono::NaiveTime;

pub const DEFAULT_SERVICE_DURATION_MINUTES: u32 = 30;
pub const DEFAULT_FREQUENCY_DAYS: u32 = 14;
pub const DEFAULT_HORIZON_DAYS: u32 = 8;
pub const DEFAULT_MAX_JOBS_PER_DAY: u32 = 8;

/// Days either side of the due date a visit may still be booked
pub const WINDOW_BUFFER_DAYS: i64 = 14;

pub const MAX_HORIZON_DAYS: u32 = 366;

/// Upper bound for `frequency_days` and the gap rules
pub const MAX_FREQUENCY_DAYS: u32 = 3_650;

/// Upper bound for `max_jobs_per_day`
pub const MAX_JOBS_PER_DAY: u32 = 50;

pub fn default_work_start() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).expect("valid static default work start")
}
