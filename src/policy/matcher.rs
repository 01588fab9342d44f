//! URL pattern matching logic.
//!
//! # Responsibilities
//! - Compile config patterns once (anchored regexes, scheme defaults)
//! - Match a URL against scheme set, domain, path, and query constraints
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Regexes are wrapped as `\A(?:pat)\z` at compile time, so partial
//!   matches can never authorize a URL
//! - Domain matching is byte-exact against the URL authority, including
//!   any explicit port
//! - Only hierarchical, userinfo-free URLs are admitted

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::config::UrlPatternConfig;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },
}

/// Which side of a URLSet a pattern sits on; determines the scheme set
/// both allowed and defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRole {
    Fetch,
    Sign,
}

impl PatternRole {
    pub fn allowed_schemes(self) -> &'static [&'static str] {
        match self {
            PatternRole::Fetch => &["http", "https"],
            PatternRole::Sign => &["https"],
        }
    }
}

/// A compiled URL pattern, immutable after construction.
pub struct UrlPattern {
    schemes: Vec<String>,
    domain: String,
    path: Regex,
    path_exclude: Vec<Regex>,
    query: Regex,
    pub error_on_stateful_headers: bool,
}

impl UrlPattern {
    /// Compile a config pattern, applying role defaults: an empty scheme
    /// list means every scheme the role allows, and absent path/query
    /// regexes default to `.*`.
    pub fn compile(config: &UrlPatternConfig, role: PatternRole) -> Result<Self, PolicyError> {
        let schemes = if config.scheme.is_empty() {
            role.allowed_schemes().iter().map(|s| s.to_string()).collect()
        } else {
            config.scheme.clone()
        };

        let path = anchored(config.path_re.as_deref().unwrap_or(".*"))?;
        let path_exclude = config
            .path_exclude_re
            .iter()
            .map(|pattern| anchored(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        let query = anchored(config.query_re.as_deref().unwrap_or(".*"))?;

        Ok(UrlPattern {
            schemes,
            domain: config.domain.clone(),
            path,
            path_exclude,
            query,
            error_on_stateful_headers: config.error_on_stateful_headers,
        })
    }

    /// True iff every constraint admits `url`.
    pub fn matches(&self, url: &Url) -> bool {
        if !self.schemes.iter().any(|s| s == url.scheme()) {
            return false;
        }
        // Opaque (non-hierarchical) URLs have nothing matchable.
        if url.cannot_be_a_base() {
            return false;
        }
        if !url.username().is_empty() || url.password().is_some() {
            return false;
        }
        if authority_host(url).as_deref() != Some(&self.domain) {
            return false;
        }
        let escaped_path = url.path();
        if !self.path.is_match(escaped_path) {
            return false;
        }
        if self.path_exclude.iter().any(|re| re.is_match(escaped_path)) {
            return false;
        }
        if !self.query.is_match(url.query().unwrap_or("")) {
            return false;
        }
        true
    }
}

/// Host as it appears in the authority: with the port when one was given
/// explicitly (default ports are normalized away at parse).
fn authority_host(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Compile a user pattern in whole-string form. `\A`/`\z` match absolute
/// string boundaries even when the subject contains newlines.
fn anchored(pattern: &str) -> Result<Regex, PolicyError> {
    Regex::new(&format!(r"\A(?:{pattern})\z")).map_err(|source| PolicyError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(config: UrlPatternConfig) -> UrlPattern {
        UrlPattern::compile(&config, PatternRole::Fetch).unwrap()
    }

    fn https_amp_example() -> UrlPatternConfig {
        UrlPatternConfig {
            scheme: vec!["https".to_string()],
            domain: "amp.example".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn scheme_must_be_listed() {
        let p = pattern(https_amp_example());
        assert!(p.matches(&Url::parse("https://amp.example/a").unwrap()));
        assert!(!p.matches(&Url::parse("http://amp.example/a").unwrap()));
    }

    #[test]
    fn empty_scheme_list_defaults_to_role() {
        let config = UrlPatternConfig {
            domain: "amp.example".to_string(),
            ..Default::default()
        };
        let fetch = UrlPattern::compile(&config, PatternRole::Fetch).unwrap();
        assert!(fetch.matches(&Url::parse("http://amp.example/").unwrap()));
        assert!(fetch.matches(&Url::parse("https://amp.example/").unwrap()));

        let sign = UrlPattern::compile(&config, PatternRole::Sign).unwrap();
        assert!(!sign.matches(&Url::parse("http://amp.example/").unwrap()));
        assert!(sign.matches(&Url::parse("https://amp.example/").unwrap()));
    }

    #[test]
    fn opaque_urls_never_match() {
        let config = UrlPatternConfig {
            scheme: vec!["mailto".to_string()],
            domain: "".to_string(),
            ..Default::default()
        };
        let p = pattern(config);
        assert!(!p.matches(&Url::parse("mailto:someone@amp.example").unwrap()));
    }

    #[test]
    fn userinfo_never_matches() {
        let p = pattern(https_amp_example());
        assert!(!p.matches(&Url::parse("https://user@amp.example/a").unwrap()));
        assert!(!p.matches(&Url::parse("https://user:pw@amp.example/a").unwrap()));
    }

    #[test]
    fn domain_is_byte_exact_including_port() {
        let p = pattern(https_amp_example());
        assert!(!p.matches(&Url::parse("https://sub.amp.example/a").unwrap()));
        assert!(!p.matches(&Url::parse("https://amp.example:8443/a").unwrap()));

        let with_port = pattern(UrlPatternConfig {
            scheme: vec!["https".to_string()],
            domain: "amp.example:8443".to_string(),
            ..Default::default()
        });
        assert!(with_port.matches(&Url::parse("https://amp.example:8443/a").unwrap()));
    }

    #[test]
    fn path_regex_is_anchored() {
        let p = pattern(UrlPatternConfig {
            path_re: Some("/foo".to_string()),
            ..https_amp_example()
        });
        assert!(p.matches(&Url::parse("https://amp.example/foo").unwrap()));
        assert!(!p.matches(&Url::parse("https://amp.example/foobar").unwrap()));
        assert!(!p.matches(&Url::parse("https://amp.example/a/foo").unwrap()));
    }

    #[test]
    fn path_matches_the_escaped_form() {
        let p = pattern(UrlPatternConfig {
            path_re: Some("/a%20b".to_string()),
            ..https_amp_example()
        });
        assert!(p.matches(&Url::parse("https://amp.example/a b").unwrap()));
    }

    #[test]
    fn exclude_rejects_even_when_path_matches() {
        let p = pattern(UrlPatternConfig {
            path_re: Some("/.*".to_string()),
            path_exclude_re: vec!["/private/.*".to_string()],
            ..https_amp_example()
        });
        assert!(p.matches(&Url::parse("https://amp.example/public/a").unwrap()));
        assert!(!p.matches(&Url::parse("https://amp.example/private/a").unwrap()));
    }

    #[test]
    fn query_regex_is_anchored_over_raw_query() {
        let p = pattern(UrlPatternConfig {
            query_re: Some("v=[0-9]+".to_string()),
            ..https_amp_example()
        });
        assert!(p.matches(&Url::parse("https://amp.example/a?v=12").unwrap()));
        assert!(!p.matches(&Url::parse("https://amp.example/a?v=12&x=1").unwrap()));
        assert!(!p.matches(&Url::parse("https://amp.example/a").unwrap()));
    }

    #[test]
    fn default_query_regex_accepts_absent_query() {
        let p = pattern(https_amp_example());
        assert!(p.matches(&Url::parse("https://amp.example/a").unwrap()));
    }

    #[test]
    fn invalid_regex_fails_compile() {
        let result = UrlPattern::compile(
            &UrlPatternConfig {
                path_re: Some("(".to_string()),
                ..https_amp_example()
            },
            PatternRole::Fetch,
        );
        assert!(matches!(result, Err(PolicyError::InvalidRegex { .. })));
    }
}
