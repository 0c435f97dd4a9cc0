//! Request metrics decorator.
//!
//! Records through the `metrics` facade, so nothing is exported unless a
//! recorder is installed (see [`install_exporter`](super::install_exporter)).
//!
//! * `requests_total` (counter): labels `method`, `route`, `code`, `service`
//! * `request_duration_seconds` (histogram): same labels
//! * `uptime_seconds` (gauge)

use std::sync::{Arc, Once};
use std::time::Instant;

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram, Unit};

use super::body;
use crate::proxy::{Handler, Middleware, SharedHandler};

pub const REQUESTS_TOTAL: &str = "requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "request_duration_seconds";
pub const UPTIME_SECONDS: &str = "uptime_seconds";

pub const REQUEST_DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

static DESCRIBE: Once = Once::new();

/// Register metric descriptions with the installed recorder.
pub fn describe() {
    DESCRIBE.call_once(|| {
        describe_counter!(
            REQUESTS_TOTAL,
            Unit::Count,
            "Total number of requests handled by the reverse proxy."
        );
        describe_histogram!(
            REQUEST_DURATION_SECONDS,
            Unit::Seconds,
            "Duration of requests handled by the reverse proxy in seconds."
        );
        describe_gauge!(
            UPTIME_SECONDS,
            Unit::Seconds,
            "Seconds since the reverse proxy started."
        );
    });
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsLayer;

impl Middleware for MetricsLayer {
    fn wrap(&self, next: SharedHandler, service: &str) -> SharedHandler {
        Arc::new(Metered {
            next,
            service: service.to_string(),
        })
    }
}

struct Metered {
    next: SharedHandler,
    service: String,
}

/// Recorded when dropped, which is once the response body is finished.
struct Measurement {
    start: Instant,
    labels: [(&'static str, String); 4],
}

impl Drop for Measurement {
    fn drop(&mut self) {
        counter!(REQUESTS_TOTAL, &self.labels).increment(1);
        histogram!(REQUEST_DURATION_SECONDS, &self.labels)
            .record(self.start.elapsed().as_secs_f64());
    }
}

#[async_trait]
impl Handler for Metered {
    async fn handle(&self, req: Request) -> Response {
        let start = Instant::now();
        let method = req.method().to_string();
        let route = req.uri().path().to_string();

        let response = self.next.handle(req).await;

        let measurement = Measurement {
            start,
            labels: [
                ("method", method),
                ("route", route),
                ("code", response.status().as_u16().to_string()),
                ("service", self.service.clone()),
            ],
        };
        body::attach(response, measurement)
    }
}
