//! `GET /v1/account/username/{username}` and `GET /v1/account/uuid/{uuid}`.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json, Response};
use flashlight_core::{CanonicalUuid, RequestContext};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn get_account_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Response, ApiError> {
    let account = state
        .account_client()
        .get_by_username(&username)
        .await
        .map_err(|e| state.api_error(e))?;
    Ok(Json(account).into_response())
}

pub async fn get_account_by_uuid(
    State(state): State<AppState>,
    Path(raw_uuid): Path<String>,
) -> Result<Response, ApiError> {
    let uuid = CanonicalUuid::parse(&raw_uuid).map_err(|e| state.api_error(e))?;
    let ctx = RequestContext::new();
    let account = state
        .account_client()
        .get_by_uuid(&uuid, &ctx)
        .await
        .map_err(|e| state.api_error(e))?;
    Ok(Json(account).into_response())
}
