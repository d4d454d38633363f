//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! ServiceConfig.routes (nested JSON)
//!     → pattern.rs (normalize chi-style patterns, check prefixes)
//!     → tree.rs (compile to RouteNode::Internal / RouteNode::Leaf)
//!     → builder.rs (materialize as axum Router, attach middleware)
//!     → services.rs (nest under prefix, swap services snapshot)
//!
//! Incoming request under the services namespace:
//!     → http/dispatch.rs loads the current snapshot
//!     → nested routers match prefix, mounts, leaf pattern
//!     → leaf endpoint = the service's ReverseProxy
//! ```
//!
//! # Design Decisions
//! - Trees are built off-line and published atomically
//! - Sibling collisions are rejected at configuration time
//! - Prefixes are unique; a taken prefix must be deregistered first

pub mod builder;
pub mod pattern;
pub mod services;
pub mod tree;

pub use builder::{BuiltTree, RouteTreeBuilder};
pub use pattern::RouteError;
pub use services::{ConfigureError, ServiceRegistry, ServiceSummary};
pub use tree::{compile_routes, RouteNode, TreeStats};
