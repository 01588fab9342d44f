//! Stateful response header sanitization.
//!
//! Headers implying per-client state (cookies, authentication challenges)
//! must not survive into a publicly-cached signed exchange. Under the
//! strict policy a present stateful header fails the request instead of
//! being dropped.

use axum::http::header::HeaderMap;

use crate::http::error::RequestError;

/// Response headers that carry per-client state.
pub const STATEFUL_RESPONSE_HEADERS: [&str; 10] = [
    "authentication-control",
    "authentication-info",
    "optional-www-authenticate",
    "proxy-authenticate",
    "proxy-authentication-info",
    "sec-websocket-accept",
    "set-cookie",
    "set-cookie2",
    "setprofile",
    "www-authenticate",
];

/// Remove every stateful header. With `error_on_stateful` set, a present
/// non-empty stateful header is a 502 instead; the header name only
/// appears in the internal message.
pub fn sanitize(headers: &mut HeaderMap, error_on_stateful: bool) -> Result<(), RequestError> {
    for name in STATEFUL_RESPONSE_HEADERS {
        if error_on_stateful && headers.get(name).is_some_and(|v| !v.is_empty()) {
            return Err(RequestError::bad_gateway(format!(
                "fetch response contains stateful header: {name}"
            )));
        }
        headers.remove(name);
    }
    Ok(())
}
