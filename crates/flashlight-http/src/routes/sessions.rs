//! `POST /v1/sessions` — `{uuid, start, end}` -> derived play sessions.

use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use flashlight_core::CanonicalUuid;
use flashlight_domain::derive_sessions;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

/// The history query is unbounded by a client-supplied limit: session
/// derivation needs the full window to find boundaries correctly.
const HISTORY_LIMIT: i64 = 10_000;

#[derive(Deserialize)]
pub struct SessionsRequest {
    uuid: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

pub async fn post_sessions(
    State(state): State<AppState>,
    Json(body): Json<SessionsRequest>,
) -> Result<Response, ApiError> {
    let uuid = CanonicalUuid::parse(&body.uuid).map_err(|e| state.api_error(e))?;
    let history = state
        .repository()
        .history(&uuid, body.start, body.end, HISTORY_LIMIT)
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(Json(derive_sessions(&history)).into_response())
}
