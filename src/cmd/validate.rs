//! `hostgate validate`: check a configuration file for errors.
//!
//! Parses and validates the config file, then reports what each host
//! would do under `run`: where it forwards, whether it is traced, and
//! which paths get through the block policy. Output is human-readable
//! text or JSON.

use std::path::Path;

use serde_json::{json, Value};

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::model::{Config, Route};
use crate::config::{parse_config_str, validation};
use crate::error::{HostgateError, ValidationError};

pub async fn execute(args: &ValidateArgs) -> Result<(), HostgateError> {
    let path = &args.config;
    let config = read(path).await?;

    if let Err(errors) = validation::validate(&config) {
        match args.format {
            ValidateFormat::Text => {
                eprintln!("\u{2717} {} has {} errors\n", path.display(), errors.len());
                for error in &errors {
                    eprintln!("{error}");
                }
            }
            ValidateFormat::Json => println!("{}", error_report(&errors)),
        }
        return Err(HostgateError::ConfigValidation { errors });
    }

    let warnings = warnings(&config);
    match args.format {
        ValidateFormat::Text => {
            println!(
                "\u{2713} {}",
                validation::format_validation_report(&path.display().to_string(), &config)
            );
            for warning in &warnings {
                eprintln!("! {warning}");
            }
        }
        ValidateFormat::Json => println!("{}", summary(&config, &warnings)),
    }

    Ok(())
}

async fn read(path: &Path) -> Result<Config, HostgateError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            HostgateError::ConfigFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            HostgateError::Io(e)
        }
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    parse_config_str(ext, &content, &path.display().to_string())
}

fn error_report(errors: &[ValidationError]) -> Value {
    let errors: Vec<Value> = errors
        .iter()
        .map(|e| {
            json!({
                "host": e.host,
                "field": e.field,
                "message": e.message,
                "suggestion": e.suggestion,
            })
        })
        .collect();
    json!({ "valid": false, "errors": errors })
}

/// A host answers 403 to everything when blocking is on and it has no
/// allowed paths.
fn blocks_everything(config: &Config, route: &Route) -> bool {
    config.block_all_requests && route.allowed_paths.is_empty()
}

/// Valid but probably unintended setups.
fn warnings(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();
    if config.routes.is_empty() {
        warnings.push("no routes configured, every request will get 404".to_string());
    }
    for (host, route) in &config.routes {
        if blocks_everything(config, route) {
            warnings.push(format!(
                "{host}: block_all_requests is on and allowed_paths is empty, every request will get 403"
            ));
        } else if !config.block_all_requests && !route.allowed_paths.is_empty() {
            warnings.push(format!(
                "{host}: allowed_paths has no effect while block_all_requests is off"
            ));
        }
    }
    warnings
}

fn summary(config: &Config, warnings: &[String]) -> Value {
    let hosts: Vec<Value> = config
        .routes
        .iter()
        .map(|(host, route)| {
            json!({
                "host": host,
                "url": route.url,
                "telemetry": route.otel,
                "allowed_paths": route.allowed_paths,
                "enforced": config.block_all_requests,
                "blocks_everything": blocks_everything(config, route),
            })
        })
        .collect();

    json!({
        "valid": true,
        "routes": config.routes.len(),
        "telemetry": config.telemetry_hosts(),
        "block_all_requests": config.block_all_requests,
        "hosts": hosts,
        "warnings": warnings,
    })
}
