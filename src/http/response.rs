//! Response mapping.
//!
//! # Responsibilities
//! - Map channel errors to HTTP status codes and short text bodies
//! - Build 302 redirects
//!
//! # Design Decisions
//! - Store failures are 5xx, never 404; timeouts are 503
//! - Store and target errors are logged here and answered with a generic
//!   body so backend details stay out of responses

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::{ChannelError, ChannelResult};

impl ChannelError {
    /// HTTP status for this error at the API boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChannelError::InvalidRequest(_) | ChannelError::ReservedIdentifier => {
                StatusCode::BAD_REQUEST
            }
            ChannelError::AlreadyExists => StatusCode::CONFLICT,
            ChannelError::NotFound => StatusCode::NOT_FOUND,
            ChannelError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ChannelError::StoreUnavailable(e) if e.is_timeout() => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ChannelError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ChannelError::InvalidTarget(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ChannelError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ChannelError::StoreUnavailable(e) => {
                tracing::error!(error = %e, "Record store unavailable");
                (status, "Storage unavailable, please retry").into_response()
            }
            ChannelError::InvalidTarget(channel_id) => {
                tracing::error!(channel_id = %channel_id, "Stored target is not a valid URL");
                (status, "Invalid redirect target").into_response()
            }
            _ => (status, self.to_string()).into_response(),
        }
    }
}

/// A 302 redirect to `target`.
pub fn found(channel_id: &str, target: &str) -> ChannelResult<Response> {
    let location = HeaderValue::from_str(target)
        .map_err(|_| ChannelError::InvalidTarget(channel_id.to_string()))?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}
