//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → GatewayConfig (immutable for the process lifetime)
//!
//! POST /configure body
//!     → service.rs (ServiceConfig, lenient JSON decode)
//!     → routing subsystem (compile, build, mount)
//! ```
//!
//! # Design Decisions
//! - Process config is static; service routing is runtime-only
//! - All fields have defaults to allow minimal configs
//! - Service documents are not persisted, only their mounted effect

pub mod loader;
pub mod schema;
pub mod service;

pub use loader::{load_config, ConfigError};
pub use schema::{GatewayConfig, ListenerConfig, ObservabilityConfig, RoutesConfig, TimeoutConfig};
pub use service::{ServiceConfig, ServiceConfigRoute};
