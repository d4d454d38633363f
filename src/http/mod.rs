//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tracing, timeouts)
//!     → POST /configure → configure.rs → routing::ServiceRegistry
//!     → /admin/*        → admin (status, services)
//!     → /services/...   → dispatch.rs → services snapshot → proxy
//! ```

pub mod configure;
pub mod dispatch;
pub mod middleware;
pub mod server;

pub use dispatch::NamespacePath;
pub use server::{AppState, GatewayServer};
