//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::any,
    Json, Router,
};
use dynamic_gateway::config::GatewayConfig;
use dynamic_gateway::{GatewayServer, MiddlewareRegistry, Shutdown};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Start a backend that echoes what it received as JSON.
///
/// `/created` answers 201 so tests can see upstream statuses relayed, and
/// `/slow` waits three seconds before answering.
pub async fn start_echo_backend() -> SocketAddr {
    let app = Router::new()
        .route("/", any(echo))
        .route("/{*path}", any(echo));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn echo(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, HeaderMap, Json<Value>) {
    let status = match uri.path() {
        "/created" => StatusCode::CREATED,
        "/slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            StatusCode::OK
        }
        _ => StatusCode::OK,
    };
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let mut reply_headers = HeaderMap::new();
    reply_headers.insert("x-backend", "echo".parse().unwrap());

    (
        status,
        reply_headers,
        Json(json!({
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query(),
            "body": String::from_utf8_lossy(&body),
            "host": header("host"),
            "forwardedFor": header("x-forwarded-for"),
            "forwardedHost": header("x-forwarded-host"),
            "requestId": header("x-request-id"),
        })),
    )
}

/// A running gateway bound to an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestGateway {
    pub async fn start() -> Self {
        Self::start_with(GatewayConfig::default(), MiddlewareRegistry::with_builtins()).await
    }

    pub async fn start_with(config: GatewayConfig, middleware: MiddlewareRegistry) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server = GatewayServer::with_middleware(config, middleware);
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        Self { addr, client, shutdown }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Submit a configuration document; returns status and body.
    pub async fn configure(&self, body: impl Into<reqwest::Body>) -> (u16, String) {
        let res = self
            .client
            .post(self.url("/configure"))
            .body(body)
            .send()
            .await
            .expect("Gateway unreachable");
        let status = res.status().as_u16();
        (status, res.text().await.unwrap())
    }

    pub async fn configure_json(&self, config: &Value) -> (u16, String) {
        self.configure(config.to_string()).await
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.expect("Gateway unreachable")
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
