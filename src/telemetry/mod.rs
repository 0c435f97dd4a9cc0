//! Request telemetry: span and metrics decorators plus the exporter.
//!
//! Routes with `otel: true` are wrapped by [`chain`]: the span decorator
//! wraps the forwarding handler and the metrics decorator wraps that.
//! Metrics go through the `metrics` facade; [`install_exporter`] serves
//! them in Prometheus format when the operator asks for it.

pub mod body;
pub mod meter;
pub mod trace;

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::gauge;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

use crate::error::HostgateError;
use crate::proxy::Chain;

pub use meter::MetricsLayer;
pub use trace::SpanLayer;

const UPTIME_INTERVAL: Duration = Duration::from_secs(2);

/// Telemetry decorators in application order.
#[must_use]
pub fn chain() -> Chain {
    Chain::new().with(SpanLayer).with(MetricsLayer)
}

/// Install the Prometheus recorder and its scrape listener on `addr`.
/// Every series carries a `service_name` label.
pub fn install_exporter(addr: SocketAddr, service_name: &str) -> Result<(), HostgateError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .add_global_label("service_name", service_name)
        .set_buckets_for_metric(
            Matcher::Full(meter::REQUEST_DURATION_SECONDS.to_string()),
            meter::REQUEST_DURATION_BUCKETS,
        )
        .and_then(PrometheusBuilder::install)
        .map_err(|e| HostgateError::MetricsExporter {
            source: Box::new(e),
        })?;

    meter::describe();
    tracing::info!(addr = %addr, "metrics exporter listening");
    Ok(())
}

/// Refresh the uptime gauge until the returned task is aborted.
pub fn spawn_uptime_gauge(started: Instant) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UPTIME_INTERVAL);
        loop {
            interval.tick().await;
            gauge!(meter::UPTIME_SECONDS).set(started.elapsed().as_secs_f64());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_has_span_then_metrics() {
        assert_eq!(chain().len(), 2);
    }
}
