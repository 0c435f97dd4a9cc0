//! `hostgate run`: start the proxy server.
//!
//! Loads the route configuration once, compiles the route table, and
//! serves until SIGTERM / Ctrl+C, draining in-flight requests for at most
//! `--shutdown-timeout` seconds.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cli::RunArgs;
use crate::config;
use crate::error::HostgateError;
use crate::logging;
use crate::middleware::CorsPolicy;
use crate::proxy::table::RouteTable;
use crate::server::{self, AppState};
use crate::telemetry;

pub async fn execute(args: RunArgs) -> Result<(), HostgateError> {
    let started = Instant::now();
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let path = config::resolve_path(args.config.as_deref()).await?;
    let config = config::load(&path).await?;

    let routes = RouteTable::build(&config)?;

    let uptime = match args.metrics_addr {
        Some(metrics_addr) => {
            telemetry::install_exporter(metrics_addr, &args.service_name)?;
            Some(telemetry::spawn_uptime_gauge(started))
        }
        None => None,
    };

    tracing::info!(
        config = %path.display(),
        routes = routes.len(),
        telemetry = config.telemetry_hosts(),
        block_all_requests = config.block_all_requests,
        hosts = ?routes.hosts(),
        "routes loaded"
    );
    if routes.is_empty() {
        tracing::warn!("no routes configured, every request will get 404");
    }

    let state = Arc::new(AppState {
        routes,
        block_all_requests: config.block_all_requests,
    });
    let router = server::build_router(state, CorsPolicy::from_list(&args.allowed_origins));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, service = %args.service_name, "hostgate started");

    server::serve(
        listener,
        router,
        server::shutdown_signal(),
        Duration::from_secs(args.shutdown_timeout),
    )
    .await?;

    if let Some(handle) = uptime {
        handle.abort();
    }

    tracing::info!("hostgate stopped");
    Ok(())
}
