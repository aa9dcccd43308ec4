//! Single-route request handler

use tracing::{error, info};
use uuid::Uuid;

use super::{parse_request, HandlerOutcome};
use crate::services::scheduler::Scheduler;
use crate::types::RouteRequest;

/// Order the stops of one route request
pub async fn handle_route(scheduler: &Scheduler, payload: &[u8]) -> HandlerOutcome {
    let request_id = Uuid::new_v4();

    let request: RouteRequest = match parse_request(payload) {
        Ok(request) => request,
        Err(e) => {
            error!("Failed to parse route request {}: {}", request_id, e);
            return HandlerOutcome::failure(request_id, &e);
        }
    };

    match scheduler.route(request).await {
        Ok(response) => {
            info!(
                "Route request {} done: {} stops, {:.1} km",
                request_id,
                response.schedule.len(),
                response.total_distance_km
            );
            HandlerOutcome::success(request_id, response)
        }
        Err(e) => {
            error!("Route request {} failed: {}", request_id, e);
            HandlerOutcome::failure(request_id, &e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_handle_route_orders_stops() {
        let payload = json!({
            "customers": [
                {"id": 10, "lat": 51.50, "lng": -0.20},
                {"id": 20, "lat": 51.50, "lng": -0.10}
            ],
            "start_location": {"lat": 51.50, "lng": -0.05}
        });

        let outcome = handle_route(&Scheduler::with_defaults(), payload.to_string().as_bytes()).await;

        assert!(outcome.success);
        let schedule = &outcome.body["payload"]["schedule"];
        assert_eq!(schedule[0]["customer_id"], 20);
        assert_eq!(schedule[0]["order"], 1);
        assert_eq!(schedule[1]["customer_id"], 10);
    }

    #[tokio::test]
    async fn test_handle_route_empty_list() {
        let outcome = handle_route(&Scheduler::with_defaults(), br#"{"customers": []}"#).await;

        assert!(!outcome.success);
        assert_eq!(outcome.body["error"]["code"], "no_customers");
    }
}
