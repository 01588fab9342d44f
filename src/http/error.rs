//! Request-path error handling.
//!
//! Every pipeline failure carries two messages: the internal one, logged
//! verbatim, and the canonical external one keyed on the status code. The
//! external body never reveals upstream URLs, header names, or upstream
//! status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// A pipeline failure: internal detail plus the status that picks the
/// canonical client-visible message.
#[derive(Debug)]
pub struct RequestError {
    status: StatusCode,
    internal: String,
}

impl RequestError {
    pub fn bad_request(internal: impl Into<String>) -> Self {
        RequestError {
            status: StatusCode::BAD_REQUEST,
            internal: internal.into(),
        }
    }

    pub fn internal(internal: impl Into<String>) -> Self {
        RequestError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            internal: internal.into(),
        }
    }

    pub fn bad_gateway(internal: impl Into<String>) -> Self {
        RequestError {
            status: StatusCode::BAD_GATEWAY,
            internal: internal.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn internal_msg(&self) -> &str {
        &self.internal
    }

    /// The canonical short body for the client. Statuses outside the
    /// error taxonomy emit an empty body.
    pub fn external_msg(&self) -> &'static str {
        match self.status {
            StatusCode::BAD_REQUEST => "400 bad request",
            StatusCode::INTERNAL_SERVER_ERROR => "500 internal server error",
            StatusCode::BAD_GATEWAY => "502 bad gateway",
            _ => "",
        }
    }
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.internal)
    }
}

impl std::error::Error for RequestError {}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        tracing::warn!(
            status = self.status.as_u16(),
            internal = %self.internal,
            "request failed"
        );
        (self.status, self.external_msg()).into_response()
    }
}
