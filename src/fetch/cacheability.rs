//! RFC 7234 shared-cache storability.
//!
//! Only publicly cacheable origin content may be signed under another
//! origin's identity, so the validator evaluates the fetched response as
//! a shared cache would and reports every reason it could not be stored.

use axum::http::header::{self, HeaderMap};
use axum::http::StatusCode;

/// Statuses a cache may store heuristically, without explicit freshness.
const HEURISTICALLY_CACHEABLE: [u16; 11] = [200, 203, 204, 206, 300, 301, 404, 405, 410, 414, 501];

/// A reason a shared cache would refuse to store the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonCacheableReason {
    RequestNoStore,
    RequestAuthorization,
    ResponseNoStore,
    ResponsePrivate,
    ResponseUncacheableStatus(u16),
}

impl std::fmt::Display for NonCacheableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonCacheableReason::RequestNoStore => {
                write!(f, "request Cache-Control contains no-store")
            }
            NonCacheableReason::RequestAuthorization => {
                write!(f, "request has Authorization without a shared-cache override")
            }
            NonCacheableReason::ResponseNoStore => {
                write!(f, "response Cache-Control contains no-store")
            }
            NonCacheableReason::ResponsePrivate => {
                write!(f, "response Cache-Control contains private")
            }
            NonCacheableReason::ResponseUncacheableStatus(status) => {
                write!(f, "status {status} is not cacheable without explicit freshness")
            }
        }
    }
}

/// Cache-Control directives the storability rules consult.
#[derive(Debug, Default)]
struct Directives {
    no_store: bool,
    private: bool,
    public: bool,
    max_age: bool,
    s_maxage: bool,
    must_revalidate: bool,
}

fn parse_directives(headers: &HeaderMap) -> Directives {
    let mut directives = Directives::default();
    for value in headers.get_all(header::CACHE_CONTROL) {
        let Ok(value) = value.to_str() else { continue };
        for directive in value.split(',') {
            let name = directive
                .split('=')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase();
            match name.as_str() {
                "no-store" => directives.no_store = true,
                "private" => directives.private = true,
                "public" => directives.public = true,
                "max-age" => directives.max_age = true,
                "s-maxage" => directives.s_maxage = true,
                "must-revalidate" => directives.must_revalidate = true,
                _ => {}
            }
        }
    }
    directives
}

/// Evaluate storability in a shared cache (RFC 7234 §3, private cache
/// semantics excluded). Returns every applicable refusal reason; empty
/// means storable.
pub fn shared_cache_reasons(
    request_headers: &HeaderMap,
    status: StatusCode,
    response_headers: &HeaderMap,
) -> Vec<NonCacheableReason> {
    let mut reasons = Vec::new();
    let request = parse_directives(request_headers);
    let response = parse_directives(response_headers);

    if request.no_store {
        reasons.push(NonCacheableReason::RequestNoStore);
    }
    if request_headers.contains_key(header::AUTHORIZATION)
        && !(response.public || response.s_maxage || response.must_revalidate)
    {
        reasons.push(NonCacheableReason::RequestAuthorization);
    }
    if response.no_store {
        reasons.push(NonCacheableReason::ResponseNoStore);
    }
    if response.private {
        reasons.push(NonCacheableReason::ResponsePrivate);
    }

    let has_explicit_freshness = response.public
        || response.max_age
        || response.s_maxage
        || response_headers.contains_key(header::EXPIRES);
    if !HEURISTICALLY_CACHEABLE.contains(&status.as_u16()) && !has_explicit_freshness {
        reasons.push(NonCacheableReason::ResponseUncacheableStatus(status.as_u16()));
    }

    reasons
}
