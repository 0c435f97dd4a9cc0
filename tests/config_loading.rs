//! Integration tests for config loading across all file formats.

use std::path::Path;

use hostgate::config::model::Config;
use hostgate::config::validation::validate;
use hostgate::config::{load, parse_config_str};
use hostgate::error::HostgateError;

fn load_example(name: &str) -> String {
    let path = format!("example/{name}");
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {path}: {e}"))
}

#[test]
fn yaml_example_loads_and_validates() {
    let content = load_example("hostgate.yaml");
    let config = parse_config_str("yaml", &content, "hostgate.yaml").unwrap();
    validate(&config).unwrap();

    assert!(config.block_all_requests);
    assert_eq!(config.routes.len(), 3);
    assert_eq!(config.telemetry_hosts(), 2);

    let api = &config.routes["api.example.com"];
    assert_eq!(api.url, "http://api-backend:8080");
    assert_eq!(api.allowed_paths, vec!["/v1/*", "/healthz"]);
}

#[tokio::test]
async fn load_reads_and_validates_file() {
    let config = load(Path::new("example/hostgate.yaml")).await.unwrap();
    let hosts: Vec<&String> = config.routes.keys().collect();
    assert_eq!(
        hosts,
        ["api.example.com", "events.example.com", "static.example.com"]
    );
}

#[cfg(feature = "json")]
#[test]
fn json_example_loads_and_validates() {
    let content = load_example("hostgate.json");
    let config = parse_config_str("json", &content, "hostgate.json").unwrap();
    validate(&config).unwrap();
    assert!(!config.block_all_requests);
    assert!(config.routes["static.example.com"].allowed_paths.is_empty());
}

#[cfg(feature = "toml")]
#[test]
fn toml_example_loads_and_validates() {
    let content = load_example("hostgate.toml");
    let config = parse_config_str("toml", &content, "hostgate.toml").unwrap();
    validate(&config).unwrap();
    assert_eq!(
        config.transport.response_header_timeout_secs,
        Some(30)
    );
}

#[test]
fn defaults_apply_when_omitted() {
    let yaml = "routes:\n  a.test:\n    url: http://backend:9000\n";
    let config: Config = parse_config_str("yaml", yaml, "inline.yaml").unwrap();
    let route = &config.routes["a.test"];

    assert!(!config.block_all_requests);
    assert!(!route.otel);
    assert!(route.allowed_paths.is_empty());
    assert_eq!(config.transport.max_idle_per_host, 100);
    assert_eq!(config.transport.idle_timeout_secs, 90);
    assert!(config.transport.response_header_timeout_secs.is_none());
}

#[test]
fn unknown_fields_are_rejected() {
    let yaml = "routes:\n  a.test:\n    url: http://backend:9000\n    retries: 3\n";
    let err = parse_config_str("yaml", yaml, "inline.yaml").unwrap_err();
    assert!(matches!(err, HostgateError::ConfigParse { .. }));
}

#[test]
fn unsupported_extension_is_rejected() {
    let err = parse_config_str("ini", "", "routes.ini").unwrap_err();
    assert!(matches!(err, HostgateError::UnsupportedFormat(ref ext) if ext == "ini"));
}

#[test]
fn validation_collects_every_error() {
    let yaml = "\
routes:
  a.test:
    url: backend:9000
    allowed_paths: [api/*]
  https://b.test:
    url: http://b:80
";
    let config = parse_config_str("yaml", yaml, "inline.yaml").unwrap();
    let errors = validate(&config).unwrap_err();

    assert_eq!(errors.len(), 3);
    assert!(errors.iter().any(|e| e.host == "a.test" && e.field == "url"));
    assert!(errors
        .iter()
        .any(|e| e.host == "a.test" && e.suggestion.as_deref() == Some("did you mean '/api/*'?")));
    assert!(errors.iter().any(|e| e.host == "https://b.test"));
}
