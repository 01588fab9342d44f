//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, --config flag)
//!     → loader.rs (parse, closed field set, normalization)
//!     → validation.rs (semantic checks, every error collected)
//!     → Config (validated, immutable)
//!     → compiled into policy + packager state at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - Unknown fields are load-time errors, not silently ignored
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{Config, UrlPatternConfig, UrlSetConfig};
