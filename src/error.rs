//! Scheduling error taxonomy

use serde::Serialize;
use thiserror::Error;

/// Failure of a whole scheduling or routing request.
///
/// Day-level problems (solver timeouts, a matrix provider hiccup) are
/// recovered inside the run and never become a `SchedulingError`.
#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no customers supplied")]
    NoCustomers,

    #[error("routing capability unavailable: {0}")]
    SolverUnavailable(String),
}

/// Machine-readable error kind reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    NoCustomers,
    SolverUnavailable,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::NoCustomers => "no_customers",
            ErrorKind::SolverUnavailable => "solver_unavailable",
        }
    }
}

impl SchedulingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulingError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            SchedulingError::NoCustomers => ErrorKind::NoCustomers,
            SchedulingError::SolverUnavailable(_) => ErrorKind::SolverUnavailable,
        }
    }

    /// Only an unreachable routing capability is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, SchedulingError::SolverUnavailable(_))
    }
}
