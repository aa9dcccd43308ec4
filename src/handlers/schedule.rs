//! Schedule request handler

use tracing::{error, info};
use uuid::Uuid;

use super::{parse_request, HandlerOutcome};
use crate::services::scheduler::Scheduler;
use crate::types::{ScheduleRequest, ScheduleResponse};

/// Plan one schedule request
pub async fn handle_schedule(scheduler: &Scheduler, payload: &[u8]) -> HandlerOutcome {
    let request_id = Uuid::new_v4();

    let request: ScheduleRequest = match parse_request(payload) {
        Ok(request) => request,
        Err(e) => {
            error!("Failed to parse schedule request {}: {}", request_id, e);
            return HandlerOutcome::failure(request_id, &e);
        }
    };

    match scheduler.run(request).await {
        Ok(result) => {
            info!(
                "Schedule request {} done: {} scheduled, {} unscheduled",
                request_id,
                result.summary.total_customers_scheduled,
                result.unscheduled.len()
            );
            HandlerOutcome::success(request_id, ScheduleResponse::from(result))
        }
        Err(e) => {
            error!("Schedule request {} failed: {}", request_id, e);
            HandlerOutcome::failure(request_id, &e)
        }
    }
}
