//! Tower middleware layered around the dispatcher.
//!
//! Per-route decorators (telemetry) are not here; they wrap individual
//! route handlers through [`proxy::Chain`](crate::proxy::Chain).

pub mod cors;

pub use cors::{cors_middleware, CorsPolicy};
