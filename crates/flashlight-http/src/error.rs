//! The single error-writer: every route failure flows through here so status
//! code, body shape, and external reporting are decided in exactly one
//! place.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use flashlight_core::{report_if_noteworthy, ErrorKind, ErrorReporter, FlashlightError};
use serde_json::json;

/// Wraps a [`FlashlightError`] together with the reporter it must be
/// reported through, so it can be returned directly from a handler and
/// converted into the shared error response shape without losing §7's
/// report-on-`ServerError`/`TemporarilyUnavailable` requirement. Build one
/// with [`AppState::api_error`](crate::state::AppState::api_error) rather
/// than constructing it directly, so a reporter is never forgotten.
pub struct ApiError {
    error: FlashlightError,
    reporter: Arc<dyn ErrorReporter>,
}

impl ApiError {
    pub fn new(error: FlashlightError, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { error, reporter }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        report_if_noteworthy(self.reporter.as_ref(), &self.error);
        write_error(&self.error)
    }
}

/// Maps an error kind to its HTTP status and JSON body.
///
/// `PlayerNotFound` is the one exception to the `{success:false,...}` shape:
/// it's surfaced as a success-shaped body for compatibility with older
/// clients that only branch on `player == null`.
pub fn write_error(error: &FlashlightError) -> Response {
    let status =
        StatusCode::from_u16(error.kind.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body = if error.kind == ErrorKind::PlayerNotFound {
        json!({ "success": true, "player": null })
    } else {
        json!({ "success": false, "cause": error.message })
    };

    (status, Json(body)).into_response()
}
