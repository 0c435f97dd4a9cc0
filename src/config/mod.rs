//! Configuration loading and validation.
//!
//! The route configuration is read once at startup from a file whose
//! extension selects the format (YAML by default, JSON and TOML behind
//! cargo features). [`load`] reads, parses and validates in one step;
//! the resulting [`Config`](model::Config) is immutable for the lifetime
//! of the process.

pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

use crate::error::HostgateError;
use model::Config;

/// File names tried in the working directory when no path is given.
pub const AUTO_DETECT_CANDIDATES: &[&str] = &[
    "hostgate.yaml",
    "hostgate.yml",
    "hostgate.json",
    "hostgate.toml",
];

/// System-wide location checked after the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/hostgate/routes.yaml";

/// Parse a config string based on file extension.
pub fn parse_config_str(
    ext: &str,
    content: &str,
    path_display: &str,
) -> Result<Config, HostgateError> {
    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| HostgateError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "json")]
        "json" => serde_json::from_str(content).map_err(|e| HostgateError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| HostgateError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        other => Err(HostgateError::UnsupportedFormat(other.to_string())),
    }
}

/// Read, parse, and validate the config file at `path`.
pub async fn load(path: &Path) -> Result<Config, HostgateError> {
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
    let config = parse_config_str(ext, &content, &path.display().to_string())?;

    if let Err(errors) = validation::validate(&config) {
        return Err(HostgateError::ConfigValidation { errors });
    }

    Ok(config)
}

/// Pick the config file to load: an explicit path wins, then the
/// working-directory candidates, then [`DEFAULT_CONFIG_PATH`].
pub async fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf, HostgateError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let fallback = std::iter::once(DEFAULT_CONFIG_PATH);
    for name in AUTO_DETECT_CANDIDATES.iter().copied().chain(fallback) {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return Ok(path);
        }
    }

    Err(HostgateError::NoConfigSource {
        hint: format!(
            "Provide --config <file> or set PROXY_CONFIG_PATH.\n  \
             Looked for {} and {DEFAULT_CONFIG_PATH}.",
            AUTO_DETECT_CANDIDATES.join(", ")
        ),
    })
}
