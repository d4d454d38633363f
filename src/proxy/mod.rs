//! Reverse-proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Leaf route matched
//!     → handler.rs (ReverseProxy::forward)
//!     → rewrite.rs (strip or keep the service segment)
//!     → upstream origin (scheme + authority from `domain`)
//!     → response relayed to the client
//! ```

pub mod handler;
pub mod rewrite;

pub use handler::{Destination, HttpClient, ProxyError, ReverseProxy};
pub use rewrite::rewrite_path;
