//! Middleware that service configurations can reference by key.

pub mod builtin;
pub mod registry;

pub use registry::{Middleware, MiddlewareChain, MiddlewareRegistry};
