//! `GET /v1/playerdata?uuid=...`

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json, Response};
use flashlight_core::{CanonicalUuid, RequestContext};
use serde::Deserialize;

use crate::error::ApiError;
use crate::persist::persist_detached;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PlayerDataQuery {
    uuid: String,
}

pub async fn get_playerdata(
    State(state): State<AppState>,
    Query(query): Query<PlayerDataQuery>,
) -> Result<Response, ApiError> {
    let uuid = CanonicalUuid::parse(&query.uuid).map_err(|e| state.api_error(e))?;
    let ctx = RequestContext::new();

    let state_for_build = state.clone();
    let uuid_for_build = uuid.clone();
    let ctx_for_build = ctx.clone();
    let (raw, pit) = state
        .cache()
        .get_or_create(uuid.clone(), &ctx, move || async move {
            let (raw, pit) = state_for_build
                .stats_client()
                .get_player_raw(&uuid_for_build, &ctx_for_build)
                .await?;
            persist_detached(state_for_build.repository().clone(), pit.clone());
            Ok((raw, pit))
        })
        .await
        .map_err(|e| state.api_error(e))?;
    let _ = pit;

    // §6.1/§6.3: the success body mirrors upstream's player shape verbatim
    // rather than flashlight's own reshaped domain type.
    Ok(Json(raw).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_uuid() {
        let result = CanonicalUuid::parse("not-a-uuid");
        assert!(result.is_err());
    }
}
