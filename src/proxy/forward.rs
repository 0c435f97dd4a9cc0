//! Single-host reverse proxy handler.
//!
//! [`ReverseProxy`] rewrites each inbound request for its target (URL,
//! hop-by-hop headers, `X-Forwarded-For`, event-stream hints), sends it
//! through a [`Transport`], and relays the response with its body
//! streamed. Upstream failures become `502 Bad Gateway`, or
//! `504 Gateway Timeout` when the response headers never arrived; nothing
//! is retried.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{ConnectInfo, Request};
use axum::http::{Uri, Version};
use axum::response::{IntoResponse, Response};
use url::{Position, Url};

use super::headers::{append_forwarded_for, apply_event_stream_hints, strip_hop_by_hop};
use super::transport::Transport;
use super::Handler;
use crate::error::UpstreamError;

pub struct ReverseProxy {
    target: Url,
    transport: Arc<dyn Transport>,
}

impl ReverseProxy {
    #[must_use]
    pub fn new(target: Url, transport: Arc<dyn Transport>) -> Self {
        Self { target, transport }
    }

    #[must_use]
    pub const fn target(&self) -> &Url {
        &self.target
    }

    fn direct(&self, req: Request) -> Result<Request, UpstreamError> {
        let (mut parts, body) = req.into_parts();

        parts.uri = upstream_uri(&self.target, &parts.uri)?;
        parts.version = Version::HTTP_11;

        strip_hop_by_hop(&mut parts.headers);
        if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            append_forwarded_for(&mut parts.headers, addr.ip());
        }
        apply_event_stream_hints(&mut parts.headers);

        Ok(Request::from_parts(parts, body))
    }
}

#[async_trait]
impl Handler for ReverseProxy {
    async fn handle(&self, req: Request) -> Response {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let result = match self.direct(req) {
            Ok(outbound) => self.transport.round_trip(outbound).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(mut response) => {
                strip_hop_by_hop(response.headers_mut());
                response
            }
            Err(e) => {
                tracing::warn!(
                    upstream = %self.target,
                    method = %method,
                    path = %path,
                    error = %e,
                    "proxy error"
                );
                e.status().into_response()
            }
        }
    }
}

/// Build the outbound URI: the target's scheme and authority, the target
/// path joined to the request path, and both query strings.
pub fn upstream_uri(target: &Url, inbound: &Uri) -> Result<Uri, UpstreamError> {
    let path = join_paths(target.path(), inbound.path());

    let target_query = target.query().filter(|q| !q.is_empty());
    let inbound_query = inbound.query().filter(|q| !q.is_empty());
    let query = match (target_query, inbound_query) {
        (Some(t), Some(r)) => Some(format!("{t}&{r}")),
        (Some(q), None) | (None, Some(q)) => Some(q.to_string()),
        (None, None) => None,
    };

    let mut uri = format!("{}{path}", &target[..Position::BeforePath]);
    if let Some(query) = query {
        uri.push('?');
        uri.push_str(&query);
    }

    uri.parse::<Uri>()
        .map_err(|source| UpstreamError::InvalidUri { uri, source })
}

/// Join two paths with exactly one slash between them.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}
