use axum::extract::State;
use axum::http::StatusCode;
use tracing::error;

use crate::app::state::AppState;

/// `POST /purge-payments`: clears every stored payment.
pub async fn purge_payments(State(state): State<AppState>) -> StatusCode {
    if let Err(err) = state.store.purge_all().await {
        error!(error = %err, "purge failed");
    }
    StatusCode::ACCEPTED
}
