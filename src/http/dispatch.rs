//! Services namespace dispatch.
//!
//! # Responsibilities
//! - Strip the services namespace from the request path
//! - Record the namespace-relative path for the proxy
//! - Route the request through the current services snapshot
//!
//! # Design Decisions
//! - One snapshot load per request; reconfiguration never blocks traffic
//! - The recorded path survives nesting, which strips matched prefixes

use axum::{
    extract::{Request, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;

use crate::http::server::AppState;

/// Request path relative to the services namespace, e.g. `/svc/ping`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacePath(String);

impl NamespacePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Handler bound to the services namespace.
pub async fn dispatch(State(state): State<AppState>, mut request: Request) -> Response {
    let relative = strip_namespace(request.uri().path(), &state.namespace);
    let path_and_query = match request.uri().query() {
        Some(query) => format!("{}?{}", relative, query),
        None => relative.clone(),
    };

    let uri = match Uri::builder().path_and_query(path_and_query).build() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(path = %relative, error = %e, "Cannot rewrite request URI");
            return (StatusCode::BAD_REQUEST, "Invalid request path").into_response();
        }
    };
    *request.uri_mut() = uri;
    request.extensions_mut().insert(NamespacePath(relative));

    let services = state.services.snapshot();
    (*services)
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {})
}

/// Path beneath `namespace`, always rooted.
pub fn strip_namespace(path: &str, namespace: &str) -> String {
    match path.strip_prefix(namespace) {
        Some(rest) if rest.is_empty() => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_namespace() {
        assert_eq!(strip_namespace("/services/svc/ping", "/services"), "/svc/ping");
        assert_eq!(strip_namespace("/services", "/services"), "/");
        assert_eq!(strip_namespace("/services/", "/services"), "/");
        assert_eq!(strip_namespace("/svc/ping", ""), "/svc/ping");
        assert_eq!(strip_namespace("/servicesx/a", "/services"), "/servicesx/a");
    }
}
