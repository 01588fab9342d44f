//! HTTP surface of the packager.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → server.rs (router: /, /priv-amppkg/doc, /amppkg/cert/{name})
//!     → packaging pipeline (policy → fetch → validate → sanitize → sign)
//!     → error.rs (internal log detail, canonical client message)
//! ```

pub mod error;
pub mod server;

pub use error::RequestError;
pub use server::{AppState, HttpServer, Packager, CERT_URL_PREFIX};
