//! Configuration validation logic.

use url::Url;

use crate::config::schema::{Config, UrlPatternConfig};
use crate::policy::PatternRole;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation error: {}", self.0)
    }
}

/// Validate a Config for semantic correctness, collecting every error.
/// Expects the loader's normalization (port default, PackagerBase
/// trailing slash) to have run already.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // 1. Required fields.
    if config.cert_file.is_empty() {
        errors.push(ValidationError("must specify CertFile".to_string()));
    }
    if config.key_file.is_empty() {
        errors.push(ValidationError("must specify KeyFile".to_string()));
    }
    if config.google_api_key.is_empty() {
        errors.push(ValidationError("must specify GoogleAPIKey".to_string()));
    }

    // 2. PackagerBase: absolute, http(s). The loader has already
    // appended the trailing slash.
    match Url::parse(&config.packager_base) {
        Ok(base) => {
            if base.scheme() != "http" && base.scheme() != "https" {
                errors.push(ValidationError(format!(
                    "PackagerBase '{}' must be over http or https",
                    config.packager_base
                )));
            }
        }
        Err(e) => {
            errors.push(ValidationError(format!(
                "PackagerBase '{}' must be an absolute URL: {}",
                config.packager_base, e
            )));
        }
    }

    // 3. URL sets.
    if config.url_set.is_empty() {
        errors.push(ValidationError(
            "must specify one or more [[URLSet]]".to_string(),
        ));
    }
    for (i, set) in config.url_set.iter().enumerate() {
        validate_pattern(
            &set.fetch,
            &format!("URLSet.{i}.Fetch"),
            PatternRole::Fetch,
            &mut errors,
        );
        validate_pattern(
            &set.sign,
            &format!("URLSet.{i}.Sign"),
            PatternRole::Sign,
            &mut errors,
        );
        if set.sign.error_on_stateful_headers {
            errors.push(ValidationError(format!(
                "URLSet.{i}.Sign.ErrorOnStatefulHeaders is not allowed; perhaps you meant to put this in the Fetch section?"
            )));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_pattern(
    pattern: &UrlPatternConfig,
    name: &str,
    role: PatternRole,
    errors: &mut Vec<ValidationError>,
) {
    for scheme in &pattern.scheme {
        if !role.allowed_schemes().contains(&scheme.as_str()) {
            errors.push(ValidationError(format!(
                "{name}.Scheme contains invalid value {scheme:?}"
            )));
        }
    }
    if pattern.domain.is_empty() {
        errors.push(ValidationError(format!("{name}.Domain must be specified")));
    }
    for (field, regexes) in [
        ("PathRE", pattern.path_re.as_slice()),
        ("QueryRE", pattern.query_re.as_slice()),
        ("PathExcludeRE", pattern.path_exclude_re.as_slice()),
    ] {
        for re in regexes {
            if regex::Regex::new(&format!(r"\A(?:{re})\z")).is_err() {
                errors.push(ValidationError(format!(
                    "{name}.{field} contains invalid regexp {re:?}"
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::*;

    fn valid_config() -> Config {
        Config {
            local_only: true,
            port: 8080,
            packager_base: "https://pkg.example/".to_string(),
            cert_file: "cert.pem".to_string(),
            key_file: "key.pem".to_string(),
            google_api_key: "key".to_string(),
            url_set: vec![UrlSetConfig {
                fetch: UrlPatternConfig {
                    scheme: vec!["https".to_string()],
                    domain: "amp.example".to_string(),
                    ..Default::default()
                },
                sign: UrlPatternConfig {
                    domain: "example.com".to_string(),
                    ..Default::default()
                },
            }],
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_required_fields() {
        let mut config = valid_config();
        config.cert_file.clear();
        config.google_api_key.clear();
        let errs = validate_config(&config).unwrap_err();
        assert!(errs.iter().any(|e| e.0.contains("CertFile")));
        assert!(errs.iter().any(|e| e.0.contains("GoogleAPIKey")));
    }

    #[test]
    fn test_empty_url_set_rejected() {
        let mut config = valid_config();
        config.url_set.clear();
        let errs = validate_config(&config).unwrap_err();
        assert!(errs.iter().any(|e| e.0.contains("URLSet")));
    }

    #[test]
    fn test_packager_base_must_be_http() {
        let mut config = valid_config();
        config.packager_base = "ftp://pkg.example/".to_string();
        let errs = validate_config(&config).unwrap_err();
        assert!(errs.iter().any(|e| e.0.contains("http or https")));
    }

    #[test]
    fn test_relative_packager_base_rejected() {
        let mut config = valid_config();
        config.packager_base = "/just/a/path/".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_stateful_flag_on_sign_rejected() {
        let mut config = valid_config();
        config.url_set[0].sign.error_on_stateful_headers = true;
        let errs = validate_config(&config).unwrap_err();
        assert!(errs
            .iter()
            .any(|e| e.0.contains("Sign.ErrorOnStatefulHeaders")));
    }

    #[test]
    fn test_invalid_scheme_for_role() {
        let mut config = valid_config();
        config.url_set[0].sign.scheme = vec!["http".to_string()];
        let errs = validate_config(&config).unwrap_err();
        assert!(errs.iter().any(|e| e.0.contains("invalid value \"http\"")));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let mut config = valid_config();
        config.url_set[0].fetch.path_re = Some("(".to_string());
        let errs = validate_config(&config).unwrap_err();
        assert!(errs.iter().any(|e| e.0.contains("PathRE")));
    }
}
