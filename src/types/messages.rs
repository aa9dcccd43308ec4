//! Response envelopes written by the CLI

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::SchedulingError;

/// Generic success response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse<T> {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub payload: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(request_id: Uuid, payload: T) -> Self {
        Self {
            id: request_id,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl ErrorResponse {
    pub fn new(request_id: Uuid, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: request_id,
            timestamp: Utc::now(),
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                retryable: false,
            },
        }
    }

    pub fn from_error(request_id: Uuid, err: &SchedulingError) -> Self {
        let mut response = Self::new(request_id, err.kind().as_str(), err.to_string());
        response.error.retryable = err.is_retryable();
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_from_scheduling_error() {
        let id = Uuid::new_v4();
        let err = SchedulingError::SolverUnavailable("connection refused".into());
        let response = ErrorResponse::from_error(id, &err);

        assert_eq!(response.id, id);
        assert_eq!(response.error.code, "solver_unavailable");
        assert!(response.error.retryable);
        assert!(response.error.message.contains("connection refused"));
    }

    #[test]
    fn test_success_response_serializes_payload() {
        let response = SuccessResponse::new(Uuid::nil(), serde_json::json!({"ok": true}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["payload"]["ok"], true);
    }
}
