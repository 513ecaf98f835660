//! End-to-end tests over a real TCP listener.

use devserver::server::serve;
use devserver::{EchoHandler, Handler, MockConfig, MockRouter};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TestServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    async fn start(handler: Arc<dyn Handler>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(serve(listener, handler, async move {
            let _ = rx.await;
        }));
        Self {
            addr,
            shutdown,
            task,
        }
    }

    async fn request(&self, raw: &str) -> String {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8(response).unwrap()
    }

    async fn stop(self) {
        self.shutdown.send(()).unwrap();
        self.task.await.unwrap().unwrap();
    }
}

fn mock_router() -> Arc<dyn Handler> {
    let config: MockConfig = serde_json::from_value(json!({
        "headers": {"X-Server": "devserver"},
        "paths": {
            "/users": {
                "headers": {"X-Path": "users"},
                "responses": {
                    "200": {"users": []},
                    "404": {"error": "not found"}
                }
            }
        }
    }))
    .unwrap();
    Arc::new(MockRouter::new(config.into_table().unwrap()))
}

fn body_of(response: &str) -> &str {
    response.split("\r\n\r\n").nth(1).unwrap_or_default()
}

#[tokio::test]
async fn test_mock_server_default_response() {
    let server = TestServer::start(mock_router()).await;

    let response = server
        .request("GET /users HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await;

    assert!(response.starts_with("HTTP/1.1 200 OK"), "{}", response);
    let lower = response.to_lowercase();
    assert!(lower.contains("x-server: devserver"));
    assert!(lower.contains("x-path: users"));
    assert_eq!(body_of(&response), r#"{"users":[]}"#);

    server.stop().await;
}

#[tokio::test]
async fn test_mock_server_requested_status() {
    let server = TestServer::start(mock_router()).await;

    let response = server
        .request(
            "GET /users?page=2 HTTP/1.1\r\nHost: localhost\r\nX-Response-Code: 404\r\nConnection: close\r\n\r\n",
        )
        .await;

    assert!(response.starts_with("HTTP/1.1 404"), "{}", response);
    assert_eq!(body_of(&response), r#"{"error":"not found"}"#);

    server.stop().await;
}

#[tokio::test]
async fn test_mock_server_unknown_path() {
    let server = TestServer::start(mock_router()).await;

    let response = server
        .request("GET /unknown HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await;
    assert!(response.starts_with("HTTP/1.1 404"), "{}", response);

    server.stop().await;
}

#[tokio::test]
async fn test_echo_server() {
    let server = TestServer::start(Arc::new(EchoHandler::new())).await;

    let response = server
        .request(
            "POST /echo HTTP/1.1\r\nHost: localhost\r\nX-Response-Code: 202\r\nX-Custom: abc\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        )
        .await;

    assert!(response.starts_with("HTTP/1.1 202"), "{}", response);
    let lower = response.to_lowercase();
    assert!(lower.contains("x-req-x-custom: abc"));
    assert!(lower.contains("x-req-method: post"));
    assert!(lower.contains("x-req-path: /echo"));
    assert!(!lower.contains("x-response-code"));
    assert_eq!(body_of(&response), "hello");

    server.stop().await;
}
