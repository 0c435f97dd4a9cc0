//! Upstream transports.
//!
//! [`Transport`] is the round-trip seam between a forwarding handler and
//! the network. [`HttpTransport`] is the connection-pooled hyper client;
//! [`SseTransport`] decorates any transport so that `text/event-stream`
//! responses lose their `Content-Length` and are relayed as an open-ended
//! stream instead of a fixed-length body.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap};
use axum::response::Response;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};

use crate::config::model::TransportConfig;
use crate::error::UpstreamError;

pub const EVENT_STREAM: &str = "text/event-stream";

pub type HttpsConnector = hyper_rustls::HttpsConnector<HttpConnector>;
pub type HttpClient = Client<HttpsConnector, Body>;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn round_trip(&self, req: Request) -> Result<Response, UpstreamError>;
}

/// Returns true when the header's media type (parameters ignored) is
/// `text/event-stream`. List-valued headers such as `Accept` match if any
/// entry does.
#[must_use]
pub fn is_event_stream(headers: &HeaderMap, name: header::HeaderName) -> bool {
    headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|entry| {
            entry
                .split(';')
                .next()
                .is_some_and(|media| media.trim().eq_ignore_ascii_case(EVENT_STREAM))
        })
}

pub struct HttpTransport {
    client: HttpClient,
    response_header_timeout: Option<Duration>,
}

impl HttpTransport {
    #[must_use]
    pub fn new(config: &TransportConfig) -> Self {
        // When multiple rustls crypto providers are compiled in, rustls cannot
        // auto-detect which one to use. Explicitly install `ring`.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(config.connect_timeout()));
        http.set_keepalive(Some(Duration::from_secs(30)));

        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(config.idle_timeout())
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build(https);

        tracing::debug!(
            max_idle_per_host = config.max_idle_per_host,
            idle_timeout_secs = config.idle_timeout_secs,
            connect_timeout_secs = config.connect_timeout_secs,
            "upstream connection pool configured"
        );

        Self {
            client,
            response_header_timeout: config.response_header_timeout(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn round_trip(&self, req: Request) -> Result<Response, UpstreamError> {
        let pending = self.client.request(req);
        let response: hyper::Response<hyper::body::Incoming> = match self.response_header_timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| UpstreamError::Timeout(limit))??,
            None => pending.await?,
        };
        Ok(response.map(Body::new))
    }
}

pub struct SseTransport<T> {
    inner: T,
}

impl<T: Transport> SseTransport<T> {
    #[must_use]
    pub const fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: Transport> Transport for SseTransport<T> {
    async fn round_trip(&self, req: Request) -> Result<Response, UpstreamError> {
        let response = self.inner.round_trip(req).await?;
        if !is_event_stream(response.headers(), header::CONTENT_TYPE) {
            return Ok(response);
        }

        let (mut parts, body) = response.into_parts();
        parts.headers.remove(header::CONTENT_LENGTH);
        // A stream body reports no size hint, so the server frames it as chunked.
        let body = Body::from_stream(body.into_data_stream());
        Ok(Response::from_parts(parts, body))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::HttpBody;
    use axum::http::HeaderValue;
    use http_body_util::BodyExt;

    use super::*;

    struct Canned {
        content_type: &'static str,
        body: &'static str,
    }

    #[async_trait]
    impl Transport for Canned {
        async fn round_trip(&self, _req: Request) -> Result<Response, UpstreamError> {
            let resp = Response::builder()
                .header(header::CONTENT_TYPE, self.content_type)
                .header(header::CONTENT_LENGTH, self.body.len())
                .body(Body::from(self.body))
                .unwrap();
            Ok(resp)
        }
    }

    #[tokio::test]
    async fn event_stream_loses_content_length() {
        let transport = SseTransport::new(Canned {
            content_type: "text/event-stream",
            body: "data: hello\n\n",
        });

        let resp = transport
            .round_trip(Request::new(Body::empty()))
            .await
            .unwrap();

        assert!(resp.headers().get(header::CONTENT_LENGTH).is_none());
        assert_eq!(resp.body().size_hint().exact(), None);

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"data: hello\n\n");
    }

    #[tokio::test]
    async fn event_stream_with_charset_is_detected() {
        let transport = SseTransport::new(Canned {
            content_type: "text/event-stream; charset=utf-8",
            body: "data: x\n\n",
        });
        let resp = transport
            .round_trip(Request::new(Body::empty()))
            .await
            .unwrap();
        assert!(resp.headers().get(header::CONTENT_LENGTH).is_none());
    }

    #[tokio::test]
    async fn other_content_types_are_untouched() {
        let transport = SseTransport::new(Canned {
            content_type: "application/json",
            body: "{}",
        });

        let resp = transport
            .round_trip(Request::new(Body::empty()))
            .await
            .unwrap();

        assert_eq!(resp.headers().get(header::CONTENT_LENGTH).unwrap(), "2");
        assert_eq!(resp.body().size_hint().exact(), Some(2));
    }

    #[test]
    fn accept_list_matches_event_stream_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/event-stream;q=0.9"),
        );
        assert!(is_event_stream(&headers, header::ACCEPT));

        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));
        assert!(!is_event_stream(&headers, header::ACCEPT));
    }
}
