//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for structural
//! errors such as malformed hosts, unusable target URLs, and allow-list
//! patterns that can never match. An empty route map is valid: every
//! request is then answered with 404. Returns a list
//! of [`ValidationError`] values with per-field suggestions.

use url::Url;

use super::model::Config;
use crate::error::ValidationError;

/// Validate a route host key. Returns `Ok(())` or a human-readable error.
pub fn validate_host(host: &str) -> Result<(), String> {
    if host.is_empty() {
        return Err("host cannot be empty".into());
    }
    if host.chars().any(char::is_whitespace) {
        return Err("host cannot contain whitespace".into());
    }
    if host.contains("://") {
        return Err("host must be a bare hostname, not a URL".into());
    }
    if host.contains('/') {
        return Err("host cannot contain a path".into());
    }
    Ok(())
}

/// Parse a target URL the way the route table does.
///
/// The URL must be absolute, use `http` or `https`, and name a host.
pub fn parse_target_url(url: &str) -> Result<Url, String> {
    let parsed = Url::parse(url).map_err(|e| format!("'{url}' is not a valid URL ({e})"))?;
    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(format!(
            "unsupported scheme '{scheme}' (expected http or https)"
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(format!("'{url}' has no host"));
    }
    Ok(parsed)
}

/// Validate a single allow-list pattern. Returns `Ok(())` or a human-readable error.
pub fn validate_allowed_path(pattern: &str) -> Result<(), String> {
    if pattern.is_empty() {
        return Err("allowed path cannot be empty".into());
    }
    if !pattern.starts_with('/') {
        return Err(format!("allowed path '{pattern}' must start with '/'"));
    }
    Ok(())
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.transport.max_idle_per_host == 0 {
        errors.push(ValidationError {
            host: "(root)".into(),
            field: "transport.max_idle_per_host".into(),
            message: "must be greater than zero".into(),
            suggestion: Some("use 100 for the default pool size".into()),
        });
    }

    for (host, route) in &config.routes {
        let host_id = if host.is_empty() {
            "(empty)".to_string()
        } else {
            host.clone()
        };

        if let Err(msg) = validate_host(host) {
            let suggestion = Url::parse(host)
                .ok()
                .and_then(|u| u.host_str().map(|h| format!("did you mean '{h}'?")));
            errors.push(ValidationError {
                host: host_id.clone(),
                field: "host".into(),
                message: msg,
                suggestion,
            });
        }

        if let Err(msg) = parse_target_url(&route.url) {
            errors.push(ValidationError {
                host: host_id.clone(),
                field: "url".into(),
                message: msg,
                suggestion: if route.url.contains("://") {
                    None
                } else {
                    Some(format!("did you mean 'http://{}'?", route.url))
                },
            });
        }

        for pattern in &route.allowed_paths {
            if let Err(msg) = validate_allowed_path(pattern) {
                errors.push(ValidationError {
                    host: host_id.clone(),
                    field: "allowed_paths".into(),
                    message: msg,
                    suggestion: if pattern.is_empty() {
                        None
                    } else {
                        Some(format!("did you mean '/{pattern}'?"))
                    },
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let mut lines = vec![format!(
        "  {} routes, {} with telemetry{}\n",
        config.routes.len(),
        config.telemetry_hosts(),
        if config.block_all_requests {
            ", blocking all requests outside allow-lists"
        } else {
            ""
        }
    )];

    for (host, route) in &config.routes {
        lines.push(format!("  {host}  -> {}", route.url));
        lines.push(format!(
            "    telemetry: {}",
            if route.otel { "on" } else { "off" }
        ));
        if config.block_all_requests {
            let allowed = if route.allowed_paths.is_empty() {
                "(none, every request is blocked)".to_string()
            } else {
                route.allowed_paths.join(", ")
            };
            lines.push(format!("    allowed:   {allowed}"));
        }
    }

    format!("{} is valid\n{}", path, lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::config::model::{Route, TransportConfig};

    fn config_with(host: &str, url: &str, allowed: &[&str]) -> Config {
        let mut routes = BTreeMap::new();
        routes.insert(
            host.to_string(),
            Route {
                url: url.into(),
                otel: false,
                allowed_paths: allowed.iter().map(|s| (*s).to_string()).collect(),
            },
        );
        Config {
            block_all_requests: false,
            transport: TransportConfig::default(),
            routes,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate(&config_with("a.test", "http://backend:9000", &["/api/*"])).is_ok());
    }

    #[test]
    fn empty_routes_are_accepted() {
        let config = Config {
            block_all_requests: true,
            transport: TransportConfig::default(),
            routes: BTreeMap::new(),
        };
        assert!(validate(&config).is_ok());
        assert!(format_validation_report("empty.yaml", &config).contains("0 routes"));
    }

    #[test]
    fn invalid_url_fails() {
        let errors = validate(&config_with("a.test", "://invalid-url", &[])).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("not a valid URL")));
    }

    #[test]
    fn scheme_less_url_fails() {
        let errors = validate(&config_with("a.test", "backend:9000", &[])).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "url"));
    }

    #[test]
    fn unsupported_scheme_fails() {
        let errors = validate(&config_with("a.test", "ftp://files:21", &[])).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("unsupported scheme")));
    }

    #[test]
    fn url_as_host_suggests_bare_hostname() {
        let errors = validate(&config_with("https://a.test", "http://b:80", &[])).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.suggestion.as_deref() == Some("did you mean 'a.test'?")));
    }

    #[test]
    fn allowed_path_without_slash_fails() {
        let errors = validate(&config_with("a.test", "http://b:80", &["api/*"])).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.suggestion.as_deref() == Some("did you mean '/api/*'?")));
    }

    #[test]
    fn zero_pool_size_fails() {
        let mut config = config_with("a.test", "http://b:80", &[]);
        config.transport.max_idle_per_host = 0;
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "transport.max_idle_per_host"));
    }

    #[test]
    fn report_lists_hosts_sorted() {
        let mut config = config_with("z.test", "http://z:80", &[]);
        config.routes.insert(
            "a.test".into(),
            Route {
                url: "http://a:80".into(),
                otel: true,
                allowed_paths: vec![],
            },
        );
        let report = format_validation_report("routes.yaml", &config);
        let a = report.find("a.test").unwrap();
        let z = report.find("z.test").unwrap();
        assert!(a < z);
        assert!(report.contains("1 with telemetry"));
    }
}
