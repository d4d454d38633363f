//! Runtime-configurable API gateway library.
//!
//! Services are registered at runtime by posting a [`ServiceConfig`] to the
//! configuration endpoint. Each registration is compiled into a route tree,
//! materialized as an axum router with its middleware, and mounted under the
//! services namespace, where matching requests are forwarded upstream by a
//! path-rewriting [`ReverseProxy`].

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::{GatewayConfig, ServiceConfig, ServiceConfigRoute};
pub use http::middleware::{Middleware, MiddlewareRegistry};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use proxy::ReverseProxy;
pub use routing::{ConfigureError, ServiceRegistry};
