//! Hostgate is a host-based HTTP reverse proxy.
//!
//! Every inbound request is routed by its `Host` header to one configured
//! backend. Routes can restrict which URL paths are forwarded, and
//! Server-Sent-Events responses are relayed as open-ended streams rather
//! than fixed-length bodies. Routes opted into telemetry get a tracing
//! span and request metrics.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, validate).
//! - [`config`] -- Configuration file loading and validation.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`middleware`] -- Tower middleware around the dispatcher (CORS).
//! - [`proxy`] -- Core forwarding: host dispatch, path allow-lists, the route
//!   table, and the SSE-aware upstream transport.
//! - [`server`] -- Axum server setup, shared application state, and graceful
//!   shutdown.
//! - [`telemetry`] -- Per-route span and metrics decorators and the
//!   Prometheus exporter.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All config file formats |
//! | `full` | All features |

// Binary crate: public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod proxy;
pub mod server;
pub mod telemetry;
