//! Certificate chain materialization.
//!
//! Parsed once at startup, immutable afterwards: the leaf DER, the
//! content-addressed CertName, and the CBOR cert-chain message served by
//! the publisher. Also hosts the startup bindings: the signing key must
//! match the leaf's public key, and the leaf must cover every configured
//! sign domain.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use p256::ecdsa::SigningKey;
use p256::SecretKey;
use sha2::{Digest, Sha256};
use thiserror::Error;
use x509_parser::extensions::GeneralName;
use x509_parser::parse_x509_certificate;

use crate::sxg::cbor::Value;

/// First element of the cert-chain CBOR message.
const CERT_CHAIN_MAGIC: &str = "\u{1F4DC}\u{26D3}";

#[derive(Debug, Error)]
pub enum CertError {
    #[error("failed to parse certificate PEM: {0}")]
    Pem(#[from] pem::PemError),

    #[error("no CERTIFICATE block found in the PEM file")]
    NoCertificate,

    #[error("failed to parse leaf certificate DER: {0}")]
    LeafDer(String),

    #[error("no private key found: {0}")]
    Key(String),

    #[error("private key does not match the leaf certificate public key")]
    KeyMismatch,

    #[error("certificate does not cover sign domain {0:?}")]
    UncoveredDomain(String),
}

/// The full chain plus everything derived from it.
pub struct CertStore {
    chain_der: Vec<Vec<u8>>,
    name: String,
    message: Vec<u8>,
}

impl CertStore {
    /// Parse a PEM chain (leaf first) and derive the name and message.
    pub fn from_pem(pem_text: &str) -> Result<Self, CertError> {
        let chain_der: Vec<Vec<u8>> = pem::parse_many(pem_text)?
            .into_iter()
            .filter(|block| block.tag() == "CERTIFICATE")
            .map(|block| block.into_contents())
            .collect();
        if chain_der.is_empty() {
            return Err(CertError::NoCertificate);
        }

        let name = cert_name(&chain_der[0]);
        let message = chain_message(&chain_der);

        Ok(CertStore {
            chain_der,
            name,
            message,
        })
    }

    /// Content-addressed basename of the leaf, stable across restarts.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The precomputed `application/cert-chain+cbor` payload.
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    pub fn leaf_der(&self) -> &[u8] {
        &self.chain_der[0]
    }

    pub fn leaf_sha256(&self) -> [u8; 32] {
        Sha256::digest(self.leaf_der()).into()
    }

    /// Startup check: the signing key's public point must equal the
    /// leaf's SubjectPublicKeyInfo point.
    pub fn verify_key_binding(&self, key: &SigningKey) -> Result<(), CertError> {
        let (_, leaf) = parse_x509_certificate(self.leaf_der())
            .map_err(|e| CertError::LeafDer(e.to_string()))?;
        let spki_point = leaf.public_key().subject_public_key.data.as_ref();
        let key_point = key.verifying_key().to_encoded_point(false);
        if spki_point != key_point.as_bytes() {
            return Err(CertError::KeyMismatch);
        }
        Ok(())
    }

    /// Startup check: the leaf must cover `domain` via a SAN dNSName
    /// (exact or single-label wildcard) or, absent SANs, the subject CN.
    /// `domain` may carry an explicit port (the URL matcher compares the
    /// full authority); certificates only name hosts, so it is stripped
    /// here.
    pub fn verify_covers_domain(&self, domain: &str) -> Result<(), CertError> {
        let host = bare_host(domain);
        let (_, leaf) = parse_x509_certificate(self.leaf_der())
            .map_err(|e| CertError::LeafDer(e.to_string()))?;

        let san = leaf
            .subject_alternative_name()
            .map_err(|e| CertError::LeafDer(e.to_string()))?;
        if let Some(san) = san {
            for general_name in &san.value.general_names {
                if let GeneralName::DNSName(dns) = general_name {
                    if dns_name_covers(dns, host) {
                        return Ok(());
                    }
                }
            }
            return Err(CertError::UncoveredDomain(domain.to_string()));
        }

        for cn in leaf.subject().iter_common_name() {
            if let Ok(cn) = cn.as_str() {
                if dns_name_covers(cn, host) {
                    return Ok(());
                }
            }
        }
        Err(CertError::UncoveredDomain(domain.to_string()))
    }
}

/// Drop an explicit `:port` suffix from a configured domain. Anything
/// after the last colon that is not a port number is left alone.
fn bare_host(domain: &str) -> &str {
    match domain.rsplit_once(':') {
        Some((host, port)) if port.parse::<u16>().is_ok() => host,
        _ => domain,
    }
}

/// Exact match, or a `*.` name matching one extra leftmost label.
fn dns_name_covers(name: &str, domain: &str) -> bool {
    if name.eq_ignore_ascii_case(domain) {
        return true;
    }
    if let Some(suffix) = name.strip_prefix("*.") {
        if let Some(rest) = domain
            .split_once('.')
            .and_then(|(label, rest)| (!label.is_empty()).then_some(rest))
        {
            return suffix.eq_ignore_ascii_case(rest);
        }
    }
    false
}

/// The stable basename the cert is served under: url-safe base64 of
/// SHA-256 over the DER bytes.
pub fn cert_name(der: &[u8]) -> String {
    URL_SAFE.encode(Sha256::digest(der))
}

/// CBOR cert-chain message: the magic string, then one map per cert.
fn chain_message(chain_der: &[Vec<u8>]) -> Vec<u8> {
    let mut items = vec![Value::text(CERT_CHAIN_MAGIC)];
    for der in chain_der {
        items.push(Value::Map(vec![(
            Value::text("cert"),
            Value::bytes(der.clone()),
        )]));
    }
    Value::Array(items).encode()
}

/// Load the P-256 signing key from PEM, accepting SEC1 (`EC PRIVATE
/// KEY`) or PKCS#8 (`PRIVATE KEY`) encodings.
pub fn load_signing_key(pem_text: &str) -> Result<SigningKey, CertError> {
    if let Ok(secret) = SecretKey::from_sec1_pem(pem_text) {
        return Ok(SigningKey::from(secret));
    }

    use p256::pkcs8::DecodePrivateKey;
    if let Ok(secret) = SecretKey::from_pkcs8_pem(pem_text) {
        return Ok(SigningKey::from(secret));
    }

    Err(CertError::Key(
        "expected SEC1 (EC PRIVATE KEY) or PKCS#8 (PRIVATE KEY) PEM".to_string(),
    ))
}
