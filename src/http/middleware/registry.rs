//! Middleware registry and chains.
//!
//! # Responsibilities
//! - Map configuration keys to middleware
//! - Resolve ordered key lists into chains, dropping unknown keys
//! - Attach chains to routers and individual route bindings
//!
//! # Design Decisions
//! - The registry is an explicit object injected through application state
//! - Unknown keys are dropped with a warning, never an error
//! - First key in a chain is the outermost layer (runs first)

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::Request,
    middleware::{from_fn, Next},
    response::Response,
    routing::MethodRouter,
    Router,
};
use futures_util::future::BoxFuture;

type InterceptorFn = dyn Fn(Request, Next) -> BoxFuture<'static, Response> + Send + Sync;

/// A named request interceptor.
#[derive(Clone)]
pub struct Middleware {
    name: Arc<str>,
    interceptor: Arc<InterceptorFn>,
}

impl Middleware {
    /// Wrap an async function taking the request and the rest of the chain.
    pub fn from_fn<F, Fut>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let interceptor: Arc<InterceptorFn> =
            Arc::new(move |request: Request, next: Next| -> BoxFuture<'static, Response> {
                Box::pin(f(request, next))
            });
        Self {
            name: name.into(),
            interceptor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, request: Request, next: Next) -> BoxFuture<'static, Response> {
        (self.interceptor)(request, next)
    }
}

impl std::fmt::Debug for Middleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Middleware").field(&self.name).finish()
    }
}

/// An ordered list of middleware resolved from configuration keys.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareChain {
    middleware: Vec<Middleware>,
}

impl MiddlewareChain {
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Names in execution order.
    pub fn names(&self) -> Vec<String> {
        self.middleware.iter().map(|m| m.name().to_string()).collect()
    }

    /// Attach the chain to every route currently in `router`.
    pub fn apply_to_router(&self, router: Router) -> Router {
        // Later layers wrap earlier ones, so apply in reverse to keep key order.
        self.middleware.iter().rev().fold(router, |router, mw| {
            let mw = mw.clone();
            router.layer(from_fn(move |request: Request, next: Next| mw.call(request, next)))
        })
    }

    /// Attach the chain to a single route binding.
    pub fn apply_to_route(&self, route: MethodRouter) -> MethodRouter {
        self.middleware.iter().rev().fold(route, |route, mw| {
            let mw = mw.clone();
            route.layer(from_fn(move |request: Request, next: Next| mw.call(request, next)))
        })
    }
}

/// Registry of middleware available to service configurations.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareRegistry {
    entries: HashMap<String, Middleware>,
}

impl MiddlewareRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in middleware.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for mw in super::builtin::all() {
            registry.register(mw.name().to_string(), mw);
        }
        registry
    }

    /// Register (or replace) the middleware for `key`.
    pub fn register(&mut self, key: impl Into<String>, middleware: Middleware) -> &mut Self {
        self.entries.insert(key.into(), middleware);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Resolve keys into a chain, preserving order and skipping unknown keys.
    pub fn resolve<I>(&self, keys: I) -> MiddlewareChain
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut middleware = Vec::new();
        for key in keys {
            let key = key.as_ref();
            match self.entries.get(key) {
                Some(mw) => middleware.push(mw.clone()),
                None => tracing::warn!(key = %key, "Unknown middleware key, skipping"),
            }
        }
        MiddlewareChain { middleware }
    }
}
