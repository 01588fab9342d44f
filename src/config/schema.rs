//! Configuration schema definitions.
//!
//! Field names mirror the TOML surface (PascalCase keys, `URLSet`
//! tables). The option set is closed: unknown fields are rejected at
//! parse time rather than ignored.

use serde::{Deserialize, Serialize};

/// Root configuration for the packager.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Bind to loopback only.
    #[serde(rename = "LocalOnly")]
    pub local_only: bool,

    /// Listen port.
    #[serde(rename = "Port")]
    pub port: u16,

    /// Absolute http(s) URL under which /amppkg/ URLs are served on the
    /// internet. Normalized to end with `/`.
    #[serde(rename = "PackagerBase")]
    pub packager_base: String,

    /// Path to the full certificate chain, PEM, leaf first.
    #[serde(rename = "CertFile")]
    pub cert_file: String,

    /// Path to the private key for the leaf certificate, PEM.
    #[serde(rename = "KeyFile")]
    pub key_file: String,

    /// Required but reserved; no observable use yet.
    #[serde(rename = "GoogleAPIKey")]
    pub google_api_key: String,

    /// Authorized (fetch, sign) pattern pairs, in priority order.
    #[serde(rename = "URLSet")]
    pub url_set: Vec<UrlSetConfig>,
}

/// A fetch/sign pattern pair.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct UrlSetConfig {
    #[serde(rename = "Fetch")]
    pub fetch: UrlPatternConfig,

    #[serde(rename = "Sign")]
    pub sign: UrlPatternConfig,
}

/// One URL pattern as written in the config file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct UrlPatternConfig {
    /// Allowed schemes; empty means every scheme the pattern's role
    /// allows.
    #[serde(rename = "Scheme")]
    pub scheme: Vec<String>,

    /// Exact host match, no wildcards.
    #[serde(rename = "Domain")]
    pub domain: String,

    /// Whole-string regex over the escaped path; defaults to `.*`.
    #[serde(rename = "PathRE")]
    pub path_re: Option<String>,

    /// Whole-string regexes; any match rejects the path.
    #[serde(rename = "PathExcludeRE")]
    pub path_exclude_re: Vec<String>,

    /// Whole-string regex over the raw query; defaults to `.*`.
    #[serde(rename = "QueryRE")]
    pub query_re: Option<String>,

    /// Fail instead of stripping when a stateful response header is
    /// present. Only legal on Fetch patterns.
    #[serde(rename = "ErrorOnStatefulHeaders")]
    pub error_on_stateful_headers: bool,
}

pub(crate) const DEFAULT_PORT: u16 = 8080;
