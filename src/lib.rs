//! AMP Signed-Exchange Packager
//!
//! An HTTP service that fetches a publicly-cacheable origin resource and
//! repackages it as a Signed HTTP Exchange attested under another
//! origin's identity, plus a companion endpoint serving the certificate
//! chain in CBOR form at a content-addressed URL.
//!
//! # Architecture Overview
//!
//! ```text
//!   GET /priv-amppkg/doc?fetch=…&sign=…
//!       │
//!       ▼
//!   ┌────────┐   ┌─────────┐   ┌──────────┐   ┌─────────┐   ┌──────┐
//!   │ policy │──▶│  fetch  │──▶│ validate │──▶│ headers │──▶│ sxg  │──▶ b0 bytes
//!   │ (match)│   │ (GET)   │   │ (RFC7234)│   │ (strip) │   │(sign)│
//!   └────────┘   └─────────┘   └──────────┘   └─────────┘   └──────┘
//!
//!   GET /amppkg/cert/{CertName} ──▶ certs (precomputed CBOR chain)
//! ```
//!
//! Certificate, key, compiled policy, and the chain message are
//! materialized once at startup and shared immutably across requests.
//!
//! Do not run this on the open internet: it exposes an API that signs
//! any permitted URL as any other, and it listens in cleartext.

// Core pipeline
pub mod fetch;
pub mod headers;
pub mod policy;
pub mod sxg;

// Certificates
pub mod certs;

// Boundary
pub mod config;
pub mod http;

pub use config::{load_config, Config};
pub use http::{HttpServer, Packager};
