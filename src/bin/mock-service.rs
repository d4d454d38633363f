//! Demo backend for manual testing.
//!
//! Replies to every path with the path it saw: JSON when the request declares
//! `Content-Type: application/json`, a small HTML fragment otherwise.

use std::net::SocketAddr;

use axum::{
    extract::Request,
    http::header,
    response::{Html, IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde::Serialize;

#[derive(Serialize)]
struct MockResponse {
    status: &'static str,
    path: String,
}

async fn reply(request: Request) -> Response {
    let path = request.uri().path().to_string();
    let wants_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v == "application/json");

    if wants_json {
        Json(MockResponse {
            status: "success",
            path,
        })
        .into_response()
    } else {
        Html(format!("<p>success @ {} </p>", path)).into_response()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8100".to_string())
        .parse()?;

    let app = Router::new()
        .route("/", any(reply))
        .route("/{*path}", any(reply));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "mock service listening");
    axum::serve(listener, app).await?;
    Ok(())
}
