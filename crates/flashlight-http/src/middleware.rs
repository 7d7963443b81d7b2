//! The middleware chain, applied outermost-to-innermost as: logger injector,
//! reporter injector, IP rate-limit gate, user-id rate-limit gate, handler.
//!
//! Each is a unary function from handler to handler, realized with
//! `axum::middleware::from_fn[_with_state]`. Router construction applies
//! `.layer()` calls in the reverse of this list, since the last layer added
//! becomes the outermost one.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use flashlight_core::FlashlightError;
use flashlight_ratelimit::{ip_key, user_id_key};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::error::write_error;
use crate::state::AppState;

/// Attaches a structured logging span carrying a freshly generated
/// correlation id, the request method+path, and the user-agent.
pub async fn logger_injector(req: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let user_agent = user_agent(req.headers());

    let span = info_span!(
        "request",
        correlation_id = %correlation_id,
        %method,
        %path,
        %user_agent,
    );

    async move {
        info!("request received");
        next.run(req).await
    }
    .instrument(span)
    .await
}

/// Records request-start time and, after the handler runs, logs duration and
/// status. The error-reporting hub itself is `state.reporter()`, already
/// reachable from handlers via `AppState`; this layer's job is timing.
pub async fn reporter_injector(
    State(_state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(req).await;
    info!(
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );
    response
}

/// Rejects with `RateLimitExceeded` when the requester's IP bucket is empty.
pub async fn ip_rate_limit_gate(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    let key = ip_key(&addr.to_string());
    if state.ip_limiter().consume(&key) {
        next.run(req).await
    } else {
        write_error(&FlashlightError::rate_limit_exceeded())
    }
}

/// Same gate keyed by the `X-User-Id` header; absent header means no
/// additional limiting beyond the IP gate.
pub async fn user_id_rate_limit_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let key = user_id_key(req.headers().get("x-user-id").and_then(|v| v.to_str().ok()));
    match key {
        Some(key) if !state.user_limiter().consume(&key) => {
            write_error(&FlashlightError::rate_limit_exceeded()).into_response()
        }
        _ => next.run(req).await,
    }
}

fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}
