//! Header rewriting for forwarded requests and relayed responses.
//!
//! [`strip_hop_by_hop`] removes connection-scoped headers (including any
//! named by `Connection`), [`append_forwarded_for`] extends the
//! `X-Forwarded-For` chain with the client address, and
//! [`apply_event_stream_hints`] marks requests that expect an event stream
//! as long-lived and uncacheable.

use std::net::IpAddr;
use std::sync::LazyLock;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use super::transport::is_event_stream;

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "proxy-connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Strip hop-by-hop headers, plus every header listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| name.trim().parse::<HeaderName>().ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Append the client address to `X-Forwarded-For`, folding any existing
/// values into a single comma separated header.
pub fn append_forwarded_for(headers: &mut HeaderMap, client_ip: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    let chain = if prior.is_empty() {
        client_ip.to_string()
    } else {
        format!("{}, {client_ip}", prior.join(", "))
    };

    if let Ok(val) = HeaderValue::from_str(&chain) {
        headers.insert(X_FORWARDED_FOR.clone(), val);
    }
}

/// When the client asked for `text/event-stream`, keep the upstream
/// connection open and disable caching on the forwarded request.
///
/// Runs after [`strip_hop_by_hop`], otherwise the `Connection` header it
/// sets would be removed again.
pub fn apply_event_stream_hints(headers: &mut HeaderMap) {
    if !is_event_stream(headers, header::ACCEPT) {
        return;
    }
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
}
