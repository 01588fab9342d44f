//! URL-set policy: which (fetch, sign) URL pairs this packager will sign.
//!
//! # Design Decisions
//! - Compiled once at startup, immutable after (thread-safe without locks)
//! - URLSets are scanned in configuration order; first full match wins
//! - Explicit no-match rather than a silent default

pub mod matcher;

pub use matcher::{PatternRole, PolicyError, UrlPattern};

use url::Url;

use crate::config::UrlSetConfig;

/// A compiled (fetch, sign) pattern pair.
pub struct UrlSet {
    pub fetch: UrlPattern,
    pub sign: UrlPattern,
}

/// The ordered list of compiled URLSets.
pub struct Policy {
    sets: Vec<UrlSet>,
}

impl Policy {
    pub fn from_config(url_sets: &[UrlSetConfig]) -> Result<Self, PolicyError> {
        let sets = url_sets
            .iter()
            .map(|set| {
                Ok(UrlSet {
                    fetch: UrlPattern::compile(&set.fetch, PatternRole::Fetch)?,
                    sign: UrlPattern::compile(&set.sign, PatternRole::Sign)?,
                })
            })
            .collect::<Result<Vec<_>, PolicyError>>()?;
        Ok(Policy { sets })
    }

    /// First URLSet whose fetch pattern matches `fetch` and whose sign
    /// pattern matches `sign`, in configuration order.
    pub fn select(&self, fetch: &Url, sign: &Url) -> Option<&UrlSet> {
        self.sets
            .iter()
            .find(|set| set.fetch.matches(fetch) && set.sign.matches(sign))
    }
}
