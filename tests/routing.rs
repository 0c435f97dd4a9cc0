//! Integration tests for path allow-lists and route table construction.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use hostgate::config::model::{Config, Route, TransportConfig};
use hostgate::error::{HostgateError, UpstreamError};
use hostgate::proxy::matcher::is_path_allowed;
use hostgate::proxy::table::RouteTable;
use hostgate::proxy::transport::Transport;
use hostgate::proxy::Chain;

fn patterns(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| (*p).to_string()).collect()
}

#[test]
fn allow_list_semantics() {
    let list = patterns(&["/api/*", "/health"]);

    assert!(is_path_allowed("/api/users", &list));
    assert!(is_path_allowed("/api/users/42/posts", &list));
    assert!(is_path_allowed("/health", &list));

    assert!(!is_path_allowed("/health/live", &list));
    assert!(!is_path_allowed("/admin", &list));
    assert!(!is_path_allowed("/", &list));
}

#[test]
fn catch_all_allows_everything() {
    let list = patterns(&["/*"]);
    for path in ["/", "/a", "/a/b/c", ""] {
        assert!(is_path_allowed(path, &list), "{path:?} should be allowed");
    }
}

#[test]
fn empty_allow_list_blocks_everything() {
    assert!(!is_path_allowed("/", &[]));
    assert!(!is_path_allowed("/api/users", &[]));
}

/// Answers every request with 204 and never touches the network.
struct NoContent;

#[async_trait]
impl Transport for NoContent {
    async fn round_trip(&self, _req: Request) -> Result<Response, UpstreamError> {
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}

fn config(routes: &[(&str, &str, bool)]) -> Config {
    Config {
        block_all_requests: false,
        transport: TransportConfig::default(),
        routes: routes
            .iter()
            .map(|(host, url, otel)| {
                (
                    (*host).to_string(),
                    Route {
                        url: (*url).to_string(),
                        otel: *otel,
                        allowed_paths: Vec::new(),
                    },
                )
            })
            .collect::<BTreeMap<_, _>>(),
    }
}

#[tokio::test]
async fn every_route_gets_a_working_handler() {
    let config = config(&[
        ("a.test", "http://a-backend:8080", true),
        ("b.test", "https://b-backend", false),
    ]);
    let table = RouteTable::build_with(&config, Arc::new(NoContent), &Chain::new()).unwrap();

    assert_eq!(table.hosts(), vec!["a.test", "b.test"]);
    for host in table.hosts() {
        let route = table.get(host).unwrap();
        let handler = route.handler().expect("builder binds a handler");
        let resp = handler
            .handle(Request::builder().uri("/x").body(Body::empty()).unwrap())
            .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
async fn non_http_scheme_aborts_build() {
    let config = config(&[
        ("a.test", "http://a-backend:8080", false),
        ("ftp.test", "ftp://files.internal", false),
    ]);

    let result = RouteTable::build_with(&config, Arc::new(NoContent), &Chain::new());
    match result {
        Err(HostgateError::InvalidTarget { host, .. }) => assert_eq!(host, "ftp.test"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected build to fail"),
    }
}

#[tokio::test]
async fn lookup_is_exact() {
    let config = config(&[("a.test", "http://a-backend:8080", false)]);
    let table = RouteTable::build_with(&config, Arc::new(NoContent), &Chain::new()).unwrap();

    assert!(table.get("a.test").is_some());
    assert!(table.get("A.TEST").is_none());
    assert!(table.get("a.test:8080").is_none());
    assert!(table.get("sub.a.test").is_none());
}
