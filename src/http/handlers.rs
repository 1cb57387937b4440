//! Route handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use serde_json::Value;

use super::pages;
use super::request::{cookie_jar, parse_json_body};
use super::response::found;
use super::server::AppState;
use crate::channel::validation::missing_fields;
use crate::channel::{is_reserved, normalize_channel_form};
use crate::error::{ChannelError, ChannelResult};
use crate::observability::metrics;
use crate::redirect::resolver::split_channel_path;
use crate::redirect::Resolution;

/// Required fields of a verify payload.
const VERIFY_FIELDS: [&str; 2] = ["channel_id", "accessKey"];

pub async fn index() -> Html<String> {
    Html(pages::index_page())
}

pub async fn register() -> Html<String> {
    Html(pages::register_page())
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// `POST /api/create`
pub async fn create_channel(
    State(state): State<AppState>,
    body: Bytes,
) -> ChannelResult<Response> {
    let input = parse_json_body(&body)?;
    let form = normalize_channel_form(&input)?;
    let created = state.registry.create(form).await?;

    Ok((
        StatusCode::CREATED,
        format!("Created, password: {}", created.password),
    )
        .into_response())
}

/// `POST /api/update`
pub async fn update_channel(
    State(state): State<AppState>,
    body: Bytes,
) -> ChannelResult<Response> {
    let input = parse_json_body(&body)?;
    let form = normalize_channel_form(&input)?;
    state.registry.update(form).await?;

    Ok((StatusCode::OK, "Updated").into_response())
}

/// `POST /api/verify`
pub async fn verify_access(
    State(state): State<AppState>,
    body: Bytes,
) -> ChannelResult<Response> {
    let input = parse_json_body(&body)?;
    let incomplete = || ChannelError::InvalidRequest("Incomplete parameters".into());
    if !missing_fields(&input, &VERIFY_FIELDS).is_empty() {
        return Err(incomplete());
    }
    let channel_id = input.get("channel_id").and_then(Value::as_str).ok_or_else(incomplete)?;
    let access_key = input.get("accessKey").and_then(Value::as_str).ok_or_else(incomplete)?;

    let proof = state.gate.verify(channel_id, access_key).await?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, proof.to_set_cookie())],
        "Verified",
    )
        .into_response())
}

/// Fallback: every path not claimed by another route is a channel request.
pub async fn resolve_channel(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> ChannelResult<Response> {
    let path = uri.path();
    let Some((channel_id, _)) = split_channel_path(path) else {
        return Ok((StatusCode::NOT_FOUND, "Not Found").into_response());
    };
    if is_reserved(&channel_id) {
        return Ok((StatusCode::NOT_FOUND, "Not Found").into_response());
    }
    if method != Method::GET && method != Method::HEAD {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }

    let cookies = cookie_jar(&headers);
    let resolution = state
        .resolver
        .resolve(&channel_id, path, uri.query(), &cookies)
        .await
        .inspect_err(|_| metrics::record_redirect("error"))?;

    match resolution {
        Resolution::Redirect(target) => found(&channel_id, &target),
        Resolution::Challenge { channel_id } => {
            Ok(Html(pages::challenge_page(&channel_id)).into_response())
        }
        Resolution::NotFound => Err(ChannelError::NotFound),
    }
}
