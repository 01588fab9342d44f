//! Certificate subsystem.
//!
//! # Data Flow
//! ```text
//! CertFile (PEM chain) ──▶ store.rs (DER, CertName, CBOR chain message)
//! KeyFile (PEM key)    ──▶ store.rs (P-256 signing key, binding checks)
//!                               │
//!                               ▼
//!                      publisher.rs (GET /amppkg/cert/{CertName})
//! ```

pub mod publisher;
pub mod store;

pub use publisher::CERT_CHAIN_CONTENT_TYPE;
pub use store::{cert_name, load_signing_key, CertError, CertStore};
