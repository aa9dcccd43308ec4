//! Business logic services

pub mod geo;
pub mod priority;
pub mod routing;
pub mod savings;
pub mod scheduler;
pub mod selector;
pub mod sequential_schedule;
pub mod vrp;
pub mod window;
