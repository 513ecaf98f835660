//! HTTP transport.
//!
//! Accepts connections with tokio, serves HTTP/1.1 with hyper and hands
//! every fully buffered request to a [`Handler`].

use crate::request::{IncomingRequest, Reply};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Default listening port.
pub const DEFAULT_PORT: u16 = 9000;

/// Request handler served by the transport.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn on_request(&self, request: IncomingRequest) -> Reply;

    /// Called once after the accept loop stops.
    fn on_shutdown(&self) {}
}

/// Listener settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Bind `config` and serve `handler` until Ctrl-C.
pub async fn run(config: ServerConfig, handler: Arc<dyn Handler>) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.addr()).await?;
    serve(listener, handler, shutdown_signal()).await
}

/// Serve `handler` on an already bound listener until `shutdown` completes.
pub async fn serve<F>(
    listener: TcpListener,
    handler: Arc<dyn Handler>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    info!(
        addr = %listener.local_addr()?,
        handler = handler.name(),
        "Starting server"
    );

    tokio::pin!(shutdown);

    loop {
        let (stream, remote_addr) = tokio::select! {
            accepted = listener.accept() => accepted?,
            _ = &mut shutdown => {
                info!("Shutdown requested, no longer accepting connections");
                break;
            }
        };

        let handler = Arc::clone(&handler);
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| {
                let handler = Arc::clone(&handler);
                async move { dispatch(handler.as_ref(), req).await }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                error!(remote = %remote_addr, error = %err, "Error serving connection");
            }
        });
    }

    handler.on_shutdown();
    Ok(())
}

async fn dispatch(
    handler: &dyn Handler,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!(path = %parts.uri.path(), "Error reading request body: {}", err);
            Bytes::new()
        }
    };

    let request = IncomingRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        headers: parts.headers,
        body,
    };
    debug!(method = %request.method, path = %request.path, "Received request");

    Ok(handler.on_request(request).await.into_response())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
