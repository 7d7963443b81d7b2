//! `POST /v1/history` — `{uuid, start, end, limit}` -> time-ordered snapshots.

use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use flashlight_core::CanonicalUuid;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct HistoryRequest {
    uuid: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    limit: i64,
}

pub async fn post_history(
    State(state): State<AppState>,
    Json(body): Json<HistoryRequest>,
) -> Result<Response, ApiError> {
    let uuid = CanonicalUuid::parse(&body.uuid).map_err(|e| state.api_error(e))?;
    let history = state
        .repository()
        .history(&uuid, body.start, body.end, body.limit)
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(Json(history).into_response())
}
