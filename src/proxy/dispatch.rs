//! The Axum fallback that routes every request by `Host`.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use super::matcher::is_path_allowed;
use crate::server::AppState;

pub const HOST_NOT_FOUND: &str = "Host not found";
pub const PROXY_NOT_CONFIGURED: &str = "Proxy is not configured";
pub const BLOCKED_BY_POLICY: &str = "Request blocked by policy";

/// Host from the `Host` header, falling back to the request-target
/// authority for absolute-form requests.
fn request_host(req: &Request) -> Option<String> {
    req.headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().authority().map(|a| a.as_str().to_string()))
}

pub async fn dispatch_handler(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let host = request_host(&req).unwrap_or_default();

    let Some(route) = state.routes.get(&host) else {
        tracing::info!(
            host = %host,
            method = %req.method(),
            path = %req.uri().path(),
            "host not found"
        );
        tracing::debug!(hosts = ?state.routes.hosts(), "available hosts");
        return (StatusCode::NOT_FOUND, HOST_NOT_FOUND).into_response();
    };

    let Some(handler) = route.handler() else {
        tracing::error!(host = %host, "route has no proxy bound");
        return (StatusCode::INTERNAL_SERVER_ERROR, PROXY_NOT_CONFIGURED).into_response();
    };

    if state.block_all_requests && !is_path_allowed(req.uri().path(), route.allowed_paths()) {
        tracing::info!(
            host = %host,
            method = %req.method(),
            path = %req.uri().path(),
            "request blocked by policy"
        );
        return (StatusCode::FORBIDDEN, BLOCKED_BY_POLICY).into_response();
    }

    handler.handle(req).await
}
