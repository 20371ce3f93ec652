use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use tracing::{debug, warn};

use crate::app::state::AppState;
use crate::models::payment::PaymentRequest;

/// `POST /payments`: admit or reject, never wait. 201 on admission, 429
/// when the queue is full, 400 on a malformed body.
pub async fn create_payment(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> StatusCode {
    let request: PaymentRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(err) => {
            debug!(error = %err, "rejecting malformed payment request");
            return StatusCode::BAD_REQUEST;
        }
    };

    match state.queue.enqueue(request) {
        Ok(()) => StatusCode::CREATED,
        Err(_) => {
            warn!(depth = state.queue.len(), "admission queue full");
            StatusCode::TOO_MANY_REQUESTS
        }
    }
}
