//! Compiles the route configuration into a host → handler table.
//!
//! [`RouteTable::build`] parses every target URL up front and fails on
//! the first bad one, so a table is either complete or not produced at
//! all. All routes share one pooled [`HttpTransport`] wrapped in
//! [`SseTransport`]; routes with telemetry enabled get the telemetry
//! [`Chain`] layered around their forwarding handler.
//!
//! The table is never mutated after construction and is shared between
//! request tasks without locking.

use std::collections::HashMap;
use std::sync::Arc;

use url::Url;

use super::forward::ReverseProxy;
use super::transport::{HttpTransport, SseTransport, Transport};
use super::{Chain, SharedHandler};
use crate::config::model::{Config, Route};
use crate::config::validation::parse_target_url;
use crate::error::HostgateError;
use crate::telemetry;

pub struct CompiledRoute {
    host: String,
    target: Url,
    allowed_paths: Vec<String>,
    telemetry: bool,
    handler: Option<SharedHandler>,
}

impl CompiledRoute {
    /// Bind a route to its handler. `handler` is only `None` for routes
    /// assembled outside [`RouteTable::build`].
    #[must_use]
    pub fn new(host: &str, target: Url, route: &Route, handler: Option<SharedHandler>) -> Self {
        Self {
            host: host.to_string(),
            target,
            allowed_paths: route.allowed_paths.clone(),
            telemetry: route.otel,
            handler,
        }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub const fn target(&self) -> &Url {
        &self.target
    }

    #[must_use]
    pub fn allowed_paths(&self) -> &[String] {
        &self.allowed_paths
    }

    #[must_use]
    pub const fn telemetry(&self) -> bool {
        self.telemetry
    }

    #[must_use]
    pub const fn handler(&self) -> Option<&SharedHandler> {
        self.handler.as_ref()
    }
}

#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<String, CompiledRoute>,
}

impl RouteTable {
    /// Build the table with the default telemetry chain and a pooled
    /// HTTP transport configured from `config.transport`.
    pub fn build(config: &Config) -> Result<Self, HostgateError> {
        let transport: Arc<dyn Transport> =
            Arc::new(SseTransport::new(HttpTransport::new(&config.transport)));
        Self::build_with(config, transport, &telemetry::chain())
    }

    /// Build the table over an explicit transport and telemetry chain.
    pub fn build_with(
        config: &Config,
        transport: Arc<dyn Transport>,
        telemetry_chain: &Chain,
    ) -> Result<Self, HostgateError> {
        let mut routes = HashMap::with_capacity(config.routes.len());

        for (host, route) in &config.routes {
            let target =
                parse_target_url(&route.url).map_err(|reason| HostgateError::InvalidTarget {
                    host: host.clone(),
                    reason,
                })?;

            let base: SharedHandler =
                Arc::new(ReverseProxy::new(target.clone(), Arc::clone(&transport)));
            let handler = if route.otel {
                telemetry_chain.apply(base, host)
            } else {
                base
            };

            tracing::debug!(
                host = %host,
                upstream = %target,
                telemetry = route.otel,
                allowed_paths = route.allowed_paths.len(),
                "route compiled"
            );

            routes.insert(
                host.clone(),
                CompiledRoute::new(host, target, route, Some(handler)),
            );
        }

        Ok(Self { routes })
    }

    /// Assemble a table from already compiled routes.
    #[must_use]
    pub fn from_routes(routes: impl IntoIterator<Item = CompiledRoute>) -> Self {
        Self {
            routes: routes
                .into_iter()
                .map(|r| (r.host.clone(), r))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, host: &str) -> Option<&CompiledRoute> {
        self.routes.get(host)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered hosts in sorted order.
    #[must_use]
    pub fn hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        hosts.sort_unstable();
        hosts
    }
}
