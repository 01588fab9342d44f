//! Signed-exchange assembly and b0 wire serialization.
//!
//! An exchange binds the sign URL to the sanitized origin response. The
//! payload is MI-encoded first so the root digest lands in the headers,
//! the headers are then signed, and the whole envelope serializes as the
//! canonical CBOR array `"htxg", "request", reqMap, "response", respMap,
//! "payload", body`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::StatusCode;
use url::Url;

use super::cbor::Value;
use super::mice;
use super::signature::ExchangeSigner;
use super::SxgError;

/// Envelope magic, first element of the serialized array.
const EXCHANGE_MAGIC: &str = "htxg";

/// A signed exchange under construction.
pub struct Exchange {
    request_url: Url,
    request_headers: HeaderMap,
    response_status: StatusCode,
    response_headers: HeaderMap,
    /// MI-encoded payload.
    payload: Vec<u8>,
}

impl Exchange {
    /// Build an exchange from the sanitized origin response.
    ///
    /// MI-encodes `body` with `record_size`, advertises the root digest in
    /// the `MI` header, and replaces framing headers. The payload is
    /// re-framed by the MI records, so `Content-Length`,
    /// `Transfer-Encoding`, and `Connection` no longer describe it.
    pub fn new(
        request_url: Url,
        response_status: StatusCode,
        mut response_headers: HeaderMap,
        body: &[u8],
        record_size: usize,
    ) -> Self {
        let encoded = mice::encode(body, record_size);

        response_headers.remove(header::CONTENT_LENGTH);
        response_headers.remove(header::TRANSFER_ENCODING);
        response_headers.remove(header::CONNECTION);
        response_headers.insert(
            header::CONTENT_ENCODING,
            HeaderValue::from_static("mi-sha256"),
        );
        let digest = format!("mi-sha256={}", URL_SAFE_NO_PAD.encode(encoded.digest));
        response_headers.insert(
            "mi",
            HeaderValue::from_str(&digest).expect("base64 digest is valid ASCII"),
        );

        Exchange {
            request_url,
            request_headers: HeaderMap::new(),
            response_status,
            response_headers,
            payload: encoded.body,
        }
    }

    /// Sign the exchange headers and install the `Signature` header.
    pub fn add_signature_header(&mut self, signer: &ExchangeSigner<'_>) -> Result<(), SxgError> {
        let headers = Value::Array(vec![self.request_map(), self.response_map()]);
        let value = signer.signature_header_value(&headers)?;
        self.response_headers.insert(
            "signature",
            HeaderValue::from_str(&value).map_err(|_| SxgError::SignatureHeaderValue)?,
        );
        Ok(())
    }

    /// Serialize to the b0 wire format.
    pub fn serialize(&self) -> Vec<u8> {
        Value::Array(vec![
            Value::text(EXCHANGE_MAGIC),
            Value::text("request"),
            self.request_map(),
            Value::text("response"),
            self.response_map(),
            Value::text("payload"),
            Value::bytes(self.payload.clone()),
        ])
        .encode()
    }

    fn request_map(&self) -> Value {
        header_map_value(
            &self.request_headers,
            &[
                (":method", "GET".to_string()),
                (":url", self.request_url.to_string()),
            ],
        )
    }

    fn response_map(&self) -> Value {
        header_map_value(
            &self.response_headers,
            &[(":status", self.response_status.as_u16().to_string())],
        )
    }
}

/// Encode a header map (plus pseudo-headers) as a CBOR map of byte
/// strings. Names are lowercase; repeated values are joined with ", ".
fn header_map_value(headers: &HeaderMap, pseudo: &[(&str, String)]) -> Value {
    let mut entries: Vec<(Value, Value)> = pseudo
        .iter()
        .map(|(k, v)| (Value::bytes(k.as_bytes().to_vec()), Value::bytes(v.as_bytes().to_vec())))
        .collect();
    for name in headers.keys() {
        let joined: Vec<&[u8]> = headers.get_all(name).iter().map(|v| v.as_bytes()).collect();
        entries.push((
            Value::bytes(name.as_str().as_bytes().to_vec()),
            Value::Bytes(joined.join(&b", "[..])),
        ));
    }
    Value::Map(entries)
}
