//! Registered services and the shared services router.
//!
//! # Responsibilities
//! - Build a service's proxy, middleware chain and route tree off-line
//! - Keep prefixes unique across registered services
//! - Publish an immutable snapshot of the services router
//!
//! # Design Decisions
//! - Copy-on-write: writers serialize on a mutex, rebuild the services router
//!   and swap it in with `ArcSwap`; readers never lock
//! - A failed registration mounts nothing
//! - In-flight requests finish on the snapshot they loaded

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{http::StatusCode, response::IntoResponse, routing::MethodRouter, Router};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::ServiceConfig;
use crate::http::middleware::MiddlewareRegistry;
use crate::observability::metrics;
use crate::proxy::{HttpClient, ProxyError, ReverseProxy};
use crate::routing::builder::RouteTreeBuilder;
use crate::routing::pattern::{normalize_prefix, RouteError};
use crate::routing::tree::compile_routes;

/// Reasons a service registration is refused.
#[derive(Debug, thiserror::Error)]
pub enum ConfigureError {
    #[error("malformed service configuration: {0}")]
    MalformedConfig(#[from] serde_json::Error),

    #[error("prefix '{0}' is already registered")]
    PrefixConflict(String),

    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// What the gateway remembers about a registered service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub prefix: String,
    pub repo: String,
    pub team: String,
    pub domain: String,
    pub preserve_prefix: bool,
    pub middleware: Vec<String>,
    pub mounts: usize,
    pub bindings: usize,
}

struct MountedService {
    router: Router,
    /// Binding for `{prefix}/` when the service routes `/`.
    root: Option<MethodRouter>,
    summary: ServiceSummary,
}

/// Owner of every mounted service.
pub struct ServiceRegistry {
    middleware: Arc<MiddlewareRegistry>,
    client: HttpClient,
    upstream_timeout: Duration,
    services: Mutex<BTreeMap<String, MountedService>>,
    snapshot: ArcSwap<Router>,
}

impl ServiceRegistry {
    pub fn new(middleware: Arc<MiddlewareRegistry>, client: HttpClient) -> Self {
        Self {
            middleware,
            client,
            upstream_timeout: Duration::from_secs(30),
            services: Mutex::new(BTreeMap::new()),
            snapshot: ArcSwap::from_pointee(compose(&BTreeMap::new())),
        }
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Registry service configurations resolve middleware keys against.
    pub fn middleware(&self) -> &MiddlewareRegistry {
        &self.middleware
    }

    /// The services router as of now. Routes relative to the services namespace.
    pub fn snapshot(&self) -> Arc<Router> {
        self.snapshot.load_full()
    }

    /// Build and mount a service.
    pub async fn register(&self, config: ServiceConfig) -> Result<ServiceSummary, ConfigureError> {
        let prefix = normalize_prefix(&config.prefix)?;

        let mut services = self.services.lock().await;
        if services.contains_key(&prefix) {
            return Err(ConfigureError::PrefixConflict(prefix));
        }

        let proxy = ReverseProxy::new(&config.domain, config.preserve_prefix, self.client.clone())?
            .with_timeout(self.upstream_timeout)
            .with_label(prefix.clone());
        let destination = proxy.destination().to_string();

        let nodes = compile_routes(&config.routes)?;
        let tree =
            RouteTreeBuilder::new(&self.middleware, Arc::new(proxy).into_endpoint()).build(&nodes)?;
        let chain = self.middleware.resolve(&config.middleware);
        let router = chain.apply_to_router(tree.router);
        let root = tree.root.map(|route| chain.apply_to_route(route));

        let summary = ServiceSummary {
            prefix: prefix.clone(),
            repo: config.repo,
            team: config.team,
            domain: config.domain,
            preserve_prefix: config.preserve_prefix,
            middleware: config.middleware,
            mounts: tree.stats.mounts,
            bindings: tree.stats.bindings,
        };

        services.insert(
            prefix.clone(),
            MountedService {
                router,
                root,
                summary: summary.clone(),
            },
        );
        self.publish(&services);

        tracing::info!(
            prefix = %prefix,
            destination = %destination,
            mounts = summary.mounts,
            bindings = summary.bindings,
            "Service mounted"
        );
        Ok(summary)
    }

    /// Unmount the service at `prefix`.
    pub async fn deregister(&self, prefix: &str) -> Option<ServiceSummary> {
        let prefix = normalize_prefix(prefix).ok()?;

        let mut services = self.services.lock().await;
        let removed = services.remove(&prefix)?;
        self.publish(&services);

        tracing::info!(prefix = %prefix, "Service unmounted");
        Some(removed.summary)
    }

    /// Summaries of every registered service, ordered by prefix.
    pub async fn list(&self) -> Vec<ServiceSummary> {
        self.services
            .lock()
            .await
            .values()
            .map(|s| s.summary.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.services.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn publish(&self, services: &BTreeMap<String, MountedService>) {
        self.snapshot.store(Arc::new(compose(services)));
        metrics::set_services_mounted(services.len());
    }
}

fn compose(services: &BTreeMap<String, MountedService>) -> Router {
    services
        .iter()
        .fold(Router::new(), |router, (prefix, service)| {
            let router = router.nest(prefix, service.router.clone());
            match &service.root {
                Some(route) => router.route(&format!("{}/", prefix), route.clone()),
                None => router,
            }
        })
        .fallback(no_route)
}

async fn no_route() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "No matching route found")
}
