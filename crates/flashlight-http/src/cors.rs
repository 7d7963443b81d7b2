//! CORS: `Access-Control-Allow-Origin` is only ever set when the request's
//! `Origin` matches one of a configured list of domain suffixes.

use axum::http::request::Parts;
use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Builds the CORS layer for the router. `allowed_suffixes` are matched
/// against the end of the request's `Origin` header, e.g. `.example.com`
/// matches `https://app.example.com` but not `https://example.com.evil.org`.
pub fn cors_layer(allowed_suffixes: Vec<String>) -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
            origin
                .to_str()
                .map(|origin| allowed_suffixes.iter().any(|suffix| origin.ends_with(suffix.as_str())))
                .unwrap_or(false)
        }))
}
