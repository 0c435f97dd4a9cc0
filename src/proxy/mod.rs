//! Host-based request forwarding.
//!
//! The [`dispatch::dispatch_handler`] function is the Axum fallback that
//! receives every request, looks up the [`table::CompiledRoute`] for its
//! `Host`, applies the allow-list policy ([`matcher`]), and delegates to the
//! route's forwarding handler ([`forward`]), which talks to the backend
//! through the SSE-aware [`transport`]. Header rewriting lives in
//! [`headers`].
//!
//! Per-host handlers share one capability, [`Handler`]. Cross-cutting
//! behaviour such as telemetry is layered on with [`Middleware`]
//! decorators, applied in order by a [`Chain`].

pub mod dispatch;
pub mod forward;
pub mod headers;
pub mod matcher;
pub mod table;
pub mod transport;

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;

// async_trait is required here because handlers are stored as Arc<dyn Handler>
// and native async fn in traits does not support dyn dispatch.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, req: Request) -> Response;
}

pub type SharedHandler = Arc<dyn Handler>;

/// Decorates a handler. `service` identifies the route being wrapped
/// (the host) so decorators can label what they record.
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: SharedHandler, service: &str) -> SharedHandler;
}

/// Ordered list of middleware. The first entry wraps the base handler
/// directly; every later entry wraps the result of the previous one, so
/// the last entry sees the request first.
#[derive(Clone, Default)]
pub struct Chain {
    layers: Vec<Arc<dyn Middleware>>,
}

impl Chain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, layer: impl Middleware + 'static) -> Self {
        self.layers.push(Arc::new(layer));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    #[must_use]
    pub fn apply(&self, base: SharedHandler, service: &str) -> SharedHandler {
        self.layers
            .iter()
            .fold(base, |next, layer| layer.wrap(next, service))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::body::Body;
    use axum::http::StatusCode;

    use super::*;

    struct Ok200;

    #[async_trait]
    impl Handler for Ok200 {
        async fn handle(&self, _req: Request) -> Response {
            Response::new(Body::empty())
        }
    }

    struct Record {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    struct Recorded {
        name: &'static str,
        service: String,
        log: Arc<Mutex<Vec<String>>>,
        next: SharedHandler,
    }

    impl Middleware for Record {
        fn wrap(&self, next: SharedHandler, service: &str) -> SharedHandler {
            Arc::new(Recorded {
                name: self.name,
                service: service.to_string(),
                log: Arc::clone(&self.log),
                next,
            })
        }
    }

    #[async_trait]
    impl Handler for Recorded {
        async fn handle(&self, req: Request) -> Response {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}@{}", self.name, self.service));
            self.next.handle(req).await
        }
    }

    #[tokio::test]
    async fn last_layer_runs_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = Chain::new()
            .with(Record {
                name: "inner",
                log: Arc::clone(&log),
            })
            .with(Record {
                name: "outer",
                log: Arc::clone(&log),
            });

        let handler = chain.apply(Arc::new(Ok200), "a.test");
        let resp = handler.handle(Request::new(Body::empty())).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(*log.lock().unwrap(), vec!["outer@a.test", "inner@a.test"]);
    }

    #[tokio::test]
    async fn empty_chain_returns_base() {
        let chain = Chain::new();
        assert!(chain.is_empty());
        let handler = chain.apply(Arc::new(Ok200), "a.test");
        let resp = handler.handle(Request::new(Body::empty())).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
