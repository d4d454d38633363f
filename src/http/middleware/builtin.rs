//! Built-in middleware available to every service configuration.

use std::time::Instant;

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use super::registry::Middleware;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Every built-in middleware, keyed by its name.
pub fn all() -> Vec<Middleware> {
    vec![
        Middleware::from_fn("request-id", request_id),
        Middleware::from_fn("access-log", access_log),
        Middleware::from_fn("no-store", no_store),
    ]
}

/// Ensure a request ID is present on the request and echoed on the response.
async fn request_id(mut request: Request, next: Next) -> Response {
    let id = match request.headers().get(&X_REQUEST_ID) {
        Some(existing) => existing.clone(),
        None => {
            let generated = HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
            request.headers_mut().insert(X_REQUEST_ID, generated.clone());
            generated
        }
    };

    let mut response = next.run(request).await;
    response.headers_mut().insert(X_REQUEST_ID, id);
    response
}

async fn access_log(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "Access"
    );
    response
}

async fn no_store(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::middleware::MiddlewareRegistry;
    use axum::{body::Body, routing::get, Router};
    use tower::ServiceExt;

    fn router(keys: &[&str]) -> Router {
        let registry = MiddlewareRegistry::with_builtins();
        let echo = get(|request: Request| async move {
            request
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("none")
                .to_string()
        });
        registry.resolve(keys).apply_to_router(Router::new().route("/", echo))
    }

    #[tokio::test]
    async fn test_request_id_generated_and_echoed() {
        let response = router(&["request-id"])
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let echoed = response.headers().get(X_REQUEST_ID).unwrap().to_str().unwrap().to_string();
        assert!(Uuid::parse_str(&echoed).is_ok());

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(body, echoed.as_bytes());
    }

    #[tokio::test]
    async fn test_request_id_kept_when_present() {
        let response = router(&["request-id"])
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers().get(X_REQUEST_ID).unwrap(), "abc-123");
    }

    #[tokio::test]
    async fn test_no_store() {
        let response = router(&["no-store", "access-log"])
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
    }
}
