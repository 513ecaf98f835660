//! Echo handler.
//!
//! Reflects every request back: request headers come back prefixed with
//! `X-Req-`, the body is returned unchanged and the status is taken from
//! `X-Response-Code` when present.

use crate::request::{IncomingRequest, Reply};
use crate::resolver::DEFAULT_STATUS;
use crate::server::Handler;
use async_trait::async_trait;
use tracing::info;

/// Prefix applied to reflected request headers.
pub const REQUEST_HEADER_PREFIX: &str = "X-Req-";

/// Echo handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

impl EchoHandler {
    pub fn new() -> Self {
        Self
    }

    /// Build the echo reply for a request.
    pub fn handle(&self, mut request: IncomingRequest) -> Reply {
        info!(method = %request.method, path = %request.path, "Received request");

        let status = request.take_response_code().unwrap_or(DEFAULT_STATUS);
        let mut reply = Reply::new(status);

        for (name, value) in request.headers.iter() {
            if let Ok(value) = value.to_str() {
                reply = reply.with_header(
                    format!("{}{}", REQUEST_HEADER_PREFIX, canonical_name(name.as_str())),
                    value,
                );
            }
        }

        reply
            .with_header(format!("{}Method", REQUEST_HEADER_PREFIX), request.method.as_str())
            .with_header(format!("{}Path", REQUEST_HEADER_PREFIX), request.path)
            .with_body(request.body)
    }
}

#[async_trait]
impl Handler for EchoHandler {
    fn name(&self) -> &str {
        "echo"
    }

    async fn on_request(&self, request: IncomingRequest) -> Reply {
        self.handle(request)
    }
}

/// `content-type` -> `Content-Type`
fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
