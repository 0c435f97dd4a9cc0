//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared, read-only route table and
//! policy switch), [`build_router`] for wrapping the host dispatcher in
//! request tracing and CORS, [`serve`] for running the listener with a
//! bounded drain, and [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::error::HostgateError;
use crate::middleware::{cors_middleware, CorsPolicy};
use crate::proxy::dispatch::dispatch_handler;
use crate::proxy::table::RouteTable;

pub struct AppState {
    pub routes: RouteTable,
    pub block_all_requests: bool,
}

pub fn build_router(state: Arc<AppState>, cors: CorsPolicy) -> Router {
    Router::new()
        .fallback(dispatch_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn_with_state(
                    Arc::new(cors),
                    cors_middleware,
                )),
        )
        .with_state(state)
}

/// Serve `router` on `listener` until `shutdown` resolves, then let
/// in-flight requests finish for at most `grace`.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    shutdown: F,
    grace: Duration,
) -> Result<(), HostgateError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (stopping_tx, mut stopping_rx) = watch::channel(false);
    let signal = async move {
        shutdown.await;
        let _ = stopping_tx.send(true);
    };

    let server = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(signal)
    .into_future();

    let drain_deadline = async move {
        if stopping_rx.wait_for(|stopping| *stopping).await.is_err() {
            std::future::pending::<()>().await;
        }
        tracing::info!(grace_secs = grace.as_secs(), "draining in-flight requests");
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => result?,
        () = drain_deadline => {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                "shutdown timeout elapsed, abandoning in-flight requests"
            );
        }
    }

    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
