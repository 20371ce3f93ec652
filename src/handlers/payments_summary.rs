use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{error, warn};

use crate::app::state::AppState;
use crate::models::payment::{Processor, SummaryResponse};

#[derive(Deserialize)]
pub struct SummaryQuery {
    from: Option<String>,
    to: Option<String>,
    /// Set by a peer asking for our local totals only, to stop the
    /// fan-out from recursing.
    single: Option<String>,
}

/// `GET /payments-summary`: totals per processor over `[from, to]`.
/// Missing or unparsable bounds default to the last 24 hours. When a peer
/// is configured its totals over the same raw range are merged in.
pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>, StatusCode> {
    let now = Utc::now();
    let from = parse_bound(query.from.as_deref()).unwrap_or(now - Duration::hours(24));
    let to = parse_bound(query.to.as_deref()).unwrap_or(now);

    let mut summary = SummaryResponse {
        default: state
            .store
            .summarize(Processor::Default, from, to)
            .await
            .map_err(|err| {
                error!(error = %err, "summary query failed");
                StatusCode::INTERNAL_SERVER_ERROR
            })?,
        fallback: state
            .store
            .summarize(Processor::Fallback, from, to)
            .await
            .map_err(|err| {
                error!(error = %err, "summary query failed");
                StatusCode::INTERNAL_SERVER_ERROR
            })?,
    };

    if query.single.is_none() {
        if let Some(peer) = &state.peer {
            match peer.summary(query.from.as_deref(), query.to.as_deref()).await {
                Ok(other) => summary.merge(other),
                // A missing peer answer degrades to local totals only.
                Err(err) => warn!(error = %err, "failed to fetch peer summary"),
            }
        }
    }

    Ok(Json(summary))
}

fn parse_bound(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}
