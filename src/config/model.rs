//! Serde data structures for the hostgate configuration file.
//!
//! Contains [`Config`] (the root), [`Route`], and [`TransportConfig`].
//! All types derive `Serialize` and `Deserialize` with
//! `deny_unknown_fields` for strict parsing. Routes are keyed by host in a
//! `BTreeMap`, so every listing of them comes out sorted.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const fn default_max_idle_per_host() -> usize {
    100
}

const fn default_idle_timeout_secs() -> u64 {
    90
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_default_transport(v: &TransportConfig) -> bool {
    *v == TransportConfig::default()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "is_false")]
    pub block_all_requests: bool,

    #[serde(default, skip_serializing_if = "is_default_transport")]
    pub transport: TransportConfig,

    pub routes: BTreeMap<String, Route>,
}

impl Config {
    /// Number of hosts with telemetry enabled.
    #[must_use]
    pub fn telemetry_hosts(&self) -> usize {
        self.routes.values().filter(|r| r.otel).count()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Route {
    pub url: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub otel: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_paths: Vec<String>,
}

/// Upstream connection pool settings shared by every route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,

    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Upper bound on waiting for the backend's response headers.
    /// Streaming bodies are not affected once headers have arrived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_header_timeout_secs: Option<u64>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: default_max_idle_per_host(),
            idle_timeout_secs: default_idle_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            response_header_timeout_secs: None,
        }
    }
}

impl TransportConfig {
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn response_header_timeout(&self) -> Option<Duration> {
        self.response_header_timeout_secs.map(Duration::from_secs)
    }
}
