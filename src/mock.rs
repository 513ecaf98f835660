//! Mock handler.
//!
//! Routes each request by exact path to its entry in the response table,
//! resolves the response and renders it.

use crate::request::{IncomingRequest, Reply};
use crate::resolver::{resolve, resolve_headers, Resolution};
use crate::server::Handler;
use crate::table::{PathEntry, ResponseTable};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// One registered path.
#[derive(Debug)]
struct Route {
    /// Table headers merged with the path headers
    headers: Vec<(String, String)>,
    entry: PathEntry,
}

/// Router built once from a response table.
#[derive(Debug)]
pub struct MockRouter {
    routes: HashMap<String, Route>,
    /// Total requests processed.
    requests_total: AtomicU64,
    /// Requests that hit a registered path.
    requests_matched: AtomicU64,
    /// Requests to unknown paths.
    requests_unmatched: AtomicU64,
}

impl MockRouter {
    /// Register one route per path of `table`.
    pub fn new(table: ResponseTable) -> Self {
        let ResponseTable { headers, paths } = table;

        let routes = paths
            .into_iter()
            .map(|(path, entry)| {
                info!(
                    path = %path,
                    per_method = entry.has_per_method_responses(),
                    responses = entry.response_count(),
                    "Registering handler for path"
                );
                let headers = resolve_headers(&headers, &entry.headers)
                    .into_iter()
                    .collect();
                (path, Route { headers, entry })
            })
            .collect::<HashMap<_, _>>();

        info!(routes = routes.len(), "Mock router initialized");

        Self {
            routes,
            requests_total: AtomicU64::new(0),
            requests_matched: AtomicU64::new(0),
            requests_unmatched: AtomicU64::new(0),
        }
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn total_requests(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn total_matched(&self) -> u64 {
        self.requests_matched.load(Ordering::Relaxed)
    }

    pub fn total_unmatched(&self) -> u64 {
        self.requests_unmatched.load(Ordering::Relaxed)
    }

    /// Produce the reply for a request.
    pub fn handle(&self, mut request: IncomingRequest) -> Reply {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        let requested = request.take_response_code();

        let Some(route) = self.routes.get(&request.path) else {
            self.requests_unmatched.fetch_add(1, Ordering::Relaxed);
            warn!(method = %request.method, path = %request.path, "No handler for path");
            return not_found();
        };
        self.requests_matched.fetch_add(1, Ordering::Relaxed);

        let resolution = resolve(&route.entry, &request.method_key(), requested);
        if resolution.is_fallback() {
            info!(
                status = resolution.status,
                path = %request.path,
                "Using default response"
            );
        }

        let status = resolution.wire_status(requested);
        debug!(
            method = %request.method,
            path = %request.path,
            status,
            kind = ?resolution.kind,
            "Resolved response"
        );

        render(status, &route.headers, &resolution)
    }
}

#[async_trait]
impl Handler for MockRouter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn on_request(&self, request: IncomingRequest) -> Reply {
        self.handle(request)
    }

    fn on_shutdown(&self) {
        info!(
            requests = self.total_requests(),
            matched = self.total_matched(),
            unmatched = self.total_unmatched(),
            "Mock server stopped"
        );
    }
}

fn render(status: u16, headers: &[(String, String)], resolution: &Resolution) -> Reply {
    let mut reply = Reply::new(status);
    for (name, value) in headers {
        reply = reply.with_header(name.as_str(), value.as_str());
    }

    match encode_body(&resolution.body) {
        Some(Body::Json(body)) => {
            if reply.header("content-type").is_none() {
                reply = reply.with_header("Content-Type", "application/json");
            }
            reply.with_body(body)
        }
        Some(Body::Raw(body)) => reply.with_body(body),
        None => reply,
    }
}

enum Body {
    Json(Bytes),
    Raw(Bytes),
}

/// Minify JSON bodies; `null` and empty bodies send nothing.
fn encode_body(body: &Bytes) -> Option<Body> {
    if body.is_empty() {
        return None;
    }

    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Null) => None,
        Ok(value) => match serde_json::to_vec(&value) {
            Ok(minified) => Some(Body::Json(Bytes::from(minified))),
            Err(_) => Some(Body::Raw(body.clone())),
        },
        Err(_) => Some(Body::Raw(body.clone())),
    }
}

fn not_found() -> Reply {
    Reply::new(404)
        .with_header("Content-Type", "application/json")
        .with_body(r#"{"error": "not_found", "message": "No handler registered for path"}"#)
}
