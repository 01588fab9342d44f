//! Content-addressed cert-chain endpoint.
//!
//! Serves the precomputed chain message under its CertName. The path is
//! content-addressed, so the payload for a given URL never changes and
//! conditional requests are cheap: a matching `If-None-Match` is always a
//! 304. Single `bytes=` ranges are honored the way a static file server
//! would.

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::CertStore;

/// Media type of the chain message (the wire payload is the CBOR chain,
/// also known as `application/cert-chain+cbor`).
pub const CERT_CHAIN_CONTENT_TYPE: &str = "application/tls-cert-chain";

/// Serve `GET /amppkg/cert/{name}`. Any name other than the store's
/// CertName is a 404.
pub fn respond(store: &CertStore, name: &str, request_headers: &HeaderMap) -> Response {
    if name != store.name() {
        return (StatusCode::NOT_FOUND, "404 page not found").into_response();
    }

    let etag = format!("\"{}\"", store.name());
    let base_headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static(CERT_CHAIN_CONTENT_TYPE),
        ),
        (
            header::ETAG,
            HeaderValue::from_str(&etag).expect("cert name is base64"),
        ),
    ];

    if if_none_match_hits(request_headers, &etag) {
        return (StatusCode::NOT_MODIFIED, base_headers).into_response();
    }

    let message = store.message();
    match requested_range(request_headers, message.len() as u64) {
        RangeOutcome::Full => (StatusCode::OK, base_headers, message.to_vec()).into_response(),
        RangeOutcome::Partial(start, end) => {
            let content_range = format!("bytes {}-{}/{}", start, end, message.len());
            let body = message[start as usize..=end as usize].to_vec();
            (
                StatusCode::PARTIAL_CONTENT,
                base_headers,
                [(
                    header::CONTENT_RANGE,
                    HeaderValue::from_str(&content_range).expect("range is ASCII"),
                )],
                body,
            )
                .into_response()
        }
        RangeOutcome::Unsatisfiable => {
            let content_range = format!("bytes */{}", message.len());
            (
                StatusCode::RANGE_NOT_SATISFIABLE,
                [(
                    header::CONTENT_RANGE,
                    HeaderValue::from_str(&content_range).expect("range is ASCII"),
                )],
                Body::empty(),
            )
                .into_response()
        }
    }
}

fn if_none_match_hits(request_headers: &HeaderMap, etag: &str) -> bool {
    let Some(value) = request_headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    value == "*" || value.split(',').any(|candidate| candidate.trim() == etag)
}

enum RangeOutcome {
    Full,
    /// Inclusive byte offsets.
    Partial(u64, u64),
    Unsatisfiable,
}

/// Parse a single `bytes=` range. Multi-range and malformed headers fall
/// back to serving the full body; a syntactically valid range outside the
/// payload is unsatisfiable.
fn requested_range(request_headers: &HeaderMap, len: u64) -> RangeOutcome {
    let Some(value) = request_headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
    else {
        return RangeOutcome::Full;
    };
    let Some(spec) = value.strip_prefix("bytes=") else {
        return RangeOutcome::Full;
    };
    if spec.contains(',') {
        return RangeOutcome::Full;
    }

    let Some((start, end)) = spec.split_once('-') else {
        return RangeOutcome::Full;
    };
    match (start.trim(), end.trim()) {
        // bytes=-n : final n bytes.
        ("", suffix) => match suffix.parse::<u64>() {
            Ok(0) | Err(_) => RangeOutcome::Unsatisfiable,
            Ok(n) => {
                let n = n.min(len);
                if len == 0 {
                    RangeOutcome::Unsatisfiable
                } else {
                    RangeOutcome::Partial(len - n, len - 1)
                }
            }
        },
        // bytes=a- : from a to the end.
        (start, "") => match start.parse::<u64>() {
            Ok(a) if a < len => RangeOutcome::Partial(a, len - 1),
            Ok(_) => RangeOutcome::Unsatisfiable,
            Err(_) => RangeOutcome::Full,
        },
        (start, end) => match (start.parse::<u64>(), end.parse::<u64>()) {
            (Ok(a), Ok(b)) if a <= b && a < len => RangeOutcome::Partial(a, b.min(len - 1)),
            (Ok(_), Ok(_)) => RangeOutcome::Unsatisfiable,
            _ => RangeOutcome::Full,
        },
    }
}
