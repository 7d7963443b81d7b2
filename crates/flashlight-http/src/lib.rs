//! The HTTP port: axum routes, the middleware chain, CORS, and the single
//! error-writer that turns a `FlashlightError` into a response.

mod cors;
pub mod error;
mod middleware;
mod persist;
mod routes;
mod state;

pub use state::{AppState, PERSIST_DEADLINE, PLAYER_CACHE_TTL};

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;

/// Builds the full router: routes, the four-stage middleware chain, and
/// CORS. `cors_allowed_suffixes` are the configured domain suffixes allowed
/// to receive `Access-Control-Allow-Origin`.
///
/// `.layer()` calls below are applied in the reverse of the spec's stated
/// outermost-to-innermost order, since the last `.layer()` added wraps
/// everything before it: user-id gate is added first (innermost of the
/// four), logger injector last (outermost). CORS wraps the whole stack so
/// an `OPTIONS` preflight is answered before any rate-limit gate runs.
pub fn build_router(state: AppState, cors_allowed_suffixes: Vec<String>) -> Router {
    Router::new()
        .route("/v1/playerdata", get(routes::get_playerdata))
        .route("/v1/history", post(routes::post_history))
        .route("/v1/sessions", post(routes::post_sessions))
        .route(
            "/v1/account/username/:username",
            get(routes::get_account_by_username),
        )
        .route("/v1/account/uuid/:uuid", get(routes::get_account_by_uuid))
        .layer(from_fn_with_state(state.clone(), middleware::user_id_rate_limit_gate))
        .layer(from_fn_with_state(state.clone(), middleware::ip_rate_limit_gate))
        .layer(from_fn_with_state(state.clone(), middleware::reporter_injector))
        .layer(from_fn(middleware::logger_injector))
        .layer(cors::cors_layer(cors_allowed_suffixes))
        .with_state(state)
}
