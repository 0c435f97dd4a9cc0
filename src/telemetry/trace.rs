//! Per-request span decorator.
//!
//! Opens one `tracing` span per request carrying OpenTelemetry style
//! HTTP attributes. Field names follow the `tracing-opentelemetry`
//! conventions (`otel.name`, `otel.kind`, `otel.status_code`) so the
//! spans map onto server spans when an OTel layer is installed.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::header;
use axum::response::Response;
use tracing::field::Empty;
use tracing::Instrument;

use super::body;
use crate::proxy::{Handler, Middleware, SharedHandler};

#[derive(Debug, Clone, Copy, Default)]
pub struct SpanLayer;

impl Middleware for SpanLayer {
    fn wrap(&self, next: SharedHandler, service: &str) -> SharedHandler {
        Arc::new(Traced {
            next,
            service: service.to_string(),
        })
    }
}

struct Traced {
    next: SharedHandler,
    service: String,
}

#[async_trait]
impl Handler for Traced {
    async fn handle(&self, req: Request) -> Response {
        let host = req
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let user_agent = req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let span = tracing::info_span!(
            "proxy_request",
            otel.name = %format!("{} {}", req.method(), req.uri().path()),
            otel.kind = "server",
            otel.status_code = Empty,
            otel.status_message = Empty,
            service = %self.service,
            http.method = %req.method(),
            http.url = %req.uri(),
            http.host = %host,
            http.user_agent = %user_agent,
            http.status_code = Empty,
        );

        let response = self.next.handle(req).instrument(span.clone()).await;

        let status = response.status();
        span.record("http.status_code", status.as_u16());
        if status.as_u16() >= 400 {
            span.record("otel.status_code", "ERROR");
            span.record(
                "otel.status_message",
                format!("HTTP {}", status.as_u16()).as_str(),
            );
        }

        // The span closes once the body is done.
        body::attach(response, span)
    }
}
