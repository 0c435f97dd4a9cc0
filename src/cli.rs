//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, validate), and their associated argument structs.
//! Every `run` flag has an environment variable equivalent for container
//! deployments.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "hostgate",
    version,
    about = "Host-based HTTP reverse proxy",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        hostgate run                         Start with ./hostgate.yaml\n  \
        hostgate run -c routes.yaml          Start with a specific config\n  \
        hostgate validate routes.yaml        Check a config file"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Run(Box<RunArgs>),

    /// Validate a config file without starting
    Validate(ValidateArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        hostgate run                                       Auto-detect config\n  \
        hostgate run -c routes.yaml -p 8080 --pretty       Local dev mode\n  \
        hostgate run --metrics-addr 0.0.0.0:9464           Expose Prometheus metrics")]
pub struct RunArgs {
    /// Config file path (.yaml, .json, .toml)
    #[arg(short, long, env = "PROXY_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 443)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- HTTP --
    /// Comma separated list of origins allowed by CORS
    #[arg(
        long,
        env = "ALLOWED_ORIGINS",
        default_value = "*",
        help_heading = "HTTP"
    )]
    pub allowed_origins: String,

    /// Seconds to wait for in-flight requests on shutdown
    #[arg(
        long,
        env = "SHUTDOWN_TIMEOUT_SECS",
        default_value_t = 20,
        help_heading = "HTTP"
    )]
    pub shutdown_timeout: u64,

    // -- Observability --
    /// Address for the Prometheus scrape endpoint (disabled when unset)
    #[arg(long, env = "METRICS_ADDR", help_heading = "Observability")]
    pub metrics_addr: Option<SocketAddr>,

    /// Service name attached to exported metrics
    #[arg(
        long,
        env = "SERVICE_NAME",
        default_value = "hostgate",
        help_heading = "Observability"
    )]
    pub service_name: String,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Config file to validate
    #[arg(default_value = "hostgate.yaml")]
    pub config: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}
