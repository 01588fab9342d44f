//! Upstream fetch and validation.
//!
//! # Data Flow
//! ```text
//! fetch URL
//!     → Fetcher (bounded GET, request retained)
//!     → validate_fetch (origin 200 + shared-cache storability)
//!     → read_body (4 MiB ceiling, over-cap rejected)
//! ```

pub mod cacheability;

use std::time::Duration;

use axum::http::header::HeaderMap;
use axum::http::StatusCode;
use url::Url;

use crate::http::error::RequestError;
use cacheability::shared_cache_reasons;

/// Hard ceiling on the origin body; the exchange is built fully in
/// memory.
pub const MAX_BODY_LENGTH: usize = 4 * 1024 * 1024;

/// Total upstream request timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Upstream HTTP client. No cookie store; redirects follow the client
/// default.
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Fetcher { client })
    }

    /// Issue the GET. Returns the request headers that went out alongside
    /// the response, so the validator can correlate request directives.
    pub async fn fetch(&self, url: &Url) -> Result<(HeaderMap, reqwest::Response), RequestError> {
        tracing::info!(url = %url, "fetching upstream");
        let request = self
            .client
            .get(url.as_str())
            .build()
            .map_err(|e| RequestError::internal(format!("error building request: {e}")))?;
        let request_headers = request.headers().clone();
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| RequestError::bad_gateway(format!("error fetching {url}: {e}")))?;
        Ok((request_headers, response))
    }
}

/// Enforce origin status and RFC 7234 shared-cache storability.
pub fn validate_fetch(
    request_headers: &HeaderMap,
    status: StatusCode,
    response_headers: &HeaderMap,
) -> Result<(), RequestError> {
    if status != StatusCode::OK {
        return Err(RequestError::bad_gateway(format!(
            "non-OK fetch: {status}"
        )));
    }
    let reasons = shared_cache_reasons(request_headers, status, response_headers);
    if !reasons.is_empty() {
        let reasons: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();
        return Err(RequestError::bad_gateway(format!(
            "non-cacheable response: {}",
            reasons.join("; ")
        )));
    }
    Ok(())
}

/// Read the body up to the ceiling. Bodies over the cap are rejected
/// rather than silently truncated, so the exchange never attests to a
/// prefix the origin did not serve as the whole resource.
pub async fn read_body(mut response: reqwest::Response) -> Result<Vec<u8>, RequestError> {
    let mut body = Vec::new();
    loop {
        let chunk = match response.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => return Ok(body),
            Err(e) => {
                return Err(RequestError::bad_gateway(format!("error reading body: {e}")));
            }
        };
        if body.len() + chunk.len() > MAX_BODY_LENGTH {
            return Err(RequestError::bad_gateway(format!(
                "body exceeds the {MAX_BODY_LENGTH}-byte limit"
            )));
        }
        body.extend_from_slice(&chunk);
    }
}
