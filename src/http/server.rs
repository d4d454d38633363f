//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the gateway's own endpoints
//! - Bind the services namespace to the dispatcher
//! - Wire up middleware (tracing, request timeout)
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    routing::{any, post},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::setup_admin_router;
use crate::config::GatewayConfig;
use crate::http::configure::configure;
use crate::http::dispatch::dispatch;
use crate::http::middleware::MiddlewareRegistry;
use crate::routing::ServiceRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<ServiceRegistry>,
    /// Services namespace without a trailing slash ("" when mounted at root).
    pub namespace: Arc<str>,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    services: Arc<ServiceRegistry>,
}

impl GatewayServer {
    /// Create a gateway with the built-in middleware registry.
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_middleware(config, MiddlewareRegistry::with_builtins())
    }

    /// Create a gateway resolving middleware keys against `middleware`.
    pub fn with_middleware(config: GatewayConfig, middleware: MiddlewareRegistry) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let services = Arc::new(
            ServiceRegistry::new(Arc::new(middleware), client)
                .with_upstream_timeout(Duration::from_secs(config.timeouts.upstream_secs)),
        );

        let state = AppState {
            services: services.clone(),
            namespace: config.routes.services_namespace.trim_end_matches('/').into(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            services,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let namespace = state.namespace.clone();
        let (namespace_root, namespace_tail) = if namespace.is_empty() {
            ("/".to_string(), "/{*rest}".to_string())
        } else {
            (namespace.to_string(), format!("{}/{{*rest}}", namespace))
        };

        Router::new()
            .route(&config.routes.configure_path, post(configure))
            .route(&namespace_root, any(dispatch))
            .route(&namespace_tail, any(dispatch))
            .merge(setup_admin_router())
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(TraceLayer::new_for_http())
    }

    /// The complete application router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The registry of mounted services.
    pub fn services(&self) -> Arc<ServiceRegistry> {
        self.services.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            namespace = %self.config.routes.services_namespace,
            configure = %self.config.routes.configure_path,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
