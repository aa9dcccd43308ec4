//! Request handlers: JSON payload in, response envelope out

pub mod route;
pub mod schedule;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::error;
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::types::{ErrorResponse, SuccessResponse};

/// Error code for failures on our side, never retryable
const INTERNAL_ERROR_CODE: &str = "internal_error";

/// Serialized response and whether the request succeeded
#[derive(Debug, Clone)]
pub struct HandlerOutcome {
    pub request_id: Uuid,
    pub body: Value,
    pub success: bool,
}

impl HandlerOutcome {
    fn success<T: Serialize>(request_id: Uuid, payload: T) -> Self {
        let envelope = SuccessResponse::new(request_id, payload);
        match serde_json::to_value(&envelope) {
            Ok(body) => Self {
                request_id,
                body,
                success: true,
            },
            Err(e) => {
                error!("Failed to serialize response {}: {}", request_id, e);
                Self::from_envelope(
                    request_id,
                    ErrorResponse::new(
                        request_id,
                        INTERNAL_ERROR_CODE,
                        format!("response could not be serialized: {}", e),
                    ),
                )
            }
        }
    }

    fn failure(request_id: Uuid, err: &SchedulingError) -> Self {
        Self::from_envelope(request_id, ErrorResponse::from_error(request_id, err))
    }

    fn from_envelope(request_id: Uuid, envelope: ErrorResponse) -> Self {
        let body = serde_json::to_value(&envelope).unwrap_or_else(|_| {
            serde_json::json!({ "error": { "code": envelope.error.code, "message": envelope.error.message } })
        });
        Self {
            request_id,
            body,
            success: false,
        }
    }
}

/// Parse a request payload; malformed JSON is an invalid request
fn parse_request<T: DeserializeOwned>(payload: &[u8]) -> Result<T, SchedulingError> {
    serde_json::from_slice(payload).map_err(|e| SchedulingError::InvalidRequest(e.to_string()))
}
