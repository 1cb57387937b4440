//! Request handling helpers.
//!
//! # Responsibilities
//! - Build the per-request tracing span around the request ID
//! - Collect cookies from every `Cookie` header
//! - Parse API bodies as loose JSON
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Bodies are parsed from raw bytes so malformed JSON maps to a plain
//!   400 `Invalid JSON` instead of the framework's rejection text

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request};
use serde_json::Value;
use tracing::Span;

use crate::error::{ChannelError, ChannelResult};
use crate::redirect::CookieJar;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Span for `TraceLayer`, tagged with the request ID set by the outer layer.
pub fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

/// Merge every `Cookie` header into one jar. HTTP/2 clients may split
/// cookies across several headers.
pub fn cookie_jar(headers: &HeaderMap) -> CookieJar {
    let mut jar = CookieJar::default();
    for value in headers.get_all(header::COOKIE) {
        if let Ok(value) = value.to_str() {
            jar.extend_from(value);
        }
    }
    jar
}

/// Parse a request body as JSON of any shape.
pub fn parse_json_body(body: &Bytes) -> ChannelResult<Value> {
    serde_json::from_slice(body).map_err(|_| ChannelError::InvalidRequest("Invalid JSON".into()))
}
