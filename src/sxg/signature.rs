//! Exchange signature construction.
//!
//! The signer binds the exchange headers (which already carry the MI root)
//! to the certificate, the published cert URL, and a bounded validity
//! window. ECDSA P-256 over SHA-256, DER-encoded, per the b0 profile.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use p256::ecdsa::{signature::Signer as _, SigningKey};
use url::Url;

use super::cbor::Value;
use super::SxgError;

/// Protocol ceiling on `expires - date`, in seconds.
pub const MAX_VALIDITY_SECS: u64 = 604_800;

/// Context string prefixed to every signing message, preceded by 64 bytes
/// of 0x20 padding and followed by a zero separator.
const SIGNING_CONTEXT: &[u8] = b"HTTP Exchange";

/// Everything needed to produce a `Signature` header for one exchange.
pub struct ExchangeSigner<'a> {
    pub date: SystemTime,
    pub expires: SystemTime,
    /// SHA-256 of the leaf certificate DER.
    pub cert_sha256: [u8; 32],
    /// Public URL of the cert-chain message, under PackagerBase.
    pub cert_url: Url,
    pub validity_url: Url,
    pub key: &'a SigningKey,
}

impl ExchangeSigner<'_> {
    /// Build the `Signature` header value covering `headers` (the CBOR
    /// array of the exchange's request and response header maps).
    pub fn signature_header_value(&self, headers: &Value) -> Result<String, SxgError> {
        let date = epoch_seconds(self.date)?;
        let expires = epoch_seconds(self.expires)?;
        let window = expires.checked_sub(date).ok_or(SxgError::InvertedWindow)?;
        if window > MAX_VALIDITY_SECS {
            return Err(SxgError::ValidityWindow {
                actual: window,
                max: MAX_VALIDITY_SECS,
            });
        }

        let message = self.signing_message(headers, date, expires);
        let signature: p256::ecdsa::Signature = self.key.sign(&message);
        let signature = signature.to_der();

        Ok(format!(
            "sig1; sig=*{}*; integrity=\"mi\"; cert-sha256=*{}*; cert-url=\"{}\"; validity-url=\"{}\"; date={}; expires={}",
            STANDARD.encode(signature.as_bytes()),
            STANDARD.encode(self.cert_sha256),
            self.cert_url,
            self.validity_url,
            date,
            expires,
        ))
    }

    /// The byte string the signature is computed over: padded context
    /// prefix, then the canonical CBOR map of the signed parameters.
    pub(crate) fn signing_message(&self, headers: &Value, date: u64, expires: u64) -> Vec<u8> {
        let params = Value::Map(vec![
            (Value::text("cert-sha256"), Value::bytes(self.cert_sha256.to_vec())),
            (Value::text("cert-url"), Value::text(self.cert_url.as_str())),
            (Value::text("date"), Value::Unsigned(date)),
            (Value::text("expires"), Value::Unsigned(expires)),
            (Value::text("headers"), headers.clone()),
            (Value::text("validity-url"), Value::text(self.validity_url.as_str())),
        ]);

        let mut message = Vec::new();
        message.extend_from_slice(&[0x20u8; 64]);
        message.extend_from_slice(SIGNING_CONTEXT);
        message.push(0);
        message.extend_from_slice(&params.encode());
        message
    }
}

fn epoch_seconds(t: SystemTime) -> Result<u64, SxgError> {
    Ok(t.duration_since(UNIX_EPOCH)
        .map_err(|_| SxgError::PreEpochTimestamp)?
        .as_secs())
}
