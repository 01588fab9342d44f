//! Signed-exchange primitives.
//!
//! # Data Flow
//! ```text
//! sanitized response + body
//!     → mice.rs (record-chain encode, root digest)
//!     → exchange.rs (envelope, MI headers)
//!     → signature.rs (validity window, ECDSA, Signature header)
//!     → exchange.rs (b0 CBOR serialization)
//! ```
//!
//! cbor.rs is the shared canonical writer; the cert-chain message in
//! `certs` uses it too.

pub mod cbor;
pub mod exchange;
pub mod mice;
pub mod signature;

pub use exchange::Exchange;
pub use mice::MI_RECORD_SIZE;
pub use signature::ExchangeSigner;

use thiserror::Error;

/// Media type of the produced exchanges.
pub const SIGNED_EXCHANGE_CONTENT_TYPE: &str = "application/signed-exchange;v=b0";

/// Errors raised while building or signing an exchange.
#[derive(Debug, Error)]
pub enum SxgError {
    #[error("signature validity window of {actual}s exceeds the {max}s ceiling")]
    ValidityWindow { actual: u64, max: u64 },

    #[error("signature expires before its date")]
    InvertedWindow,

    #[error("signature timestamp precedes the unix epoch")]
    PreEpochTimestamp,

    #[error("signature header value contains non-ASCII bytes")]
    SignatureHeaderValue,
}
