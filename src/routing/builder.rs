//! Route tree materialization.
//!
//! # Responsibilities
//! - Turn compiled [`RouteNode`]s into an axum [`Router`]
//! - Mount a sub-router per internal node, bind a route per leaf
//! - Attach each node's middleware chain at the right level
//!
//! # Design Decisions
//! - Built off-line: nothing is visible to traffic until the caller mounts it
//! - Every sibling is processed; recursion never cuts the sibling loop short
//! - All leaves share one endpoint (the service's proxy)
//! - Full paths are checked with `matchit` before axum sees them, since axum
//!   panics on conflicting routes
//! - A mount holding a `/` leaf also answers `{mount}/`

use axum::{routing::MethodRouter, Router};

use crate::http::middleware::MiddlewareRegistry;
use crate::routing::pattern::RouteError;
use crate::routing::tree::{RouteNode, TreeStats};

/// A materialized route tree, ready to be mounted.
#[derive(Debug)]
pub struct BuiltTree {
    pub router: Router,
    /// The tree's `/` binding, to be bound again at `{prefix}/` by the caller.
    pub root: Option<MethodRouter>,
    pub stats: TreeStats,
}

/// Builds routers for one service.
pub struct RouteTreeBuilder<'a> {
    registry: &'a MiddlewareRegistry,
    endpoint: MethodRouter,
}

impl<'a> RouteTreeBuilder<'a> {
    /// `endpoint` is bound at every leaf.
    pub fn new(registry: &'a MiddlewareRegistry, endpoint: MethodRouter) -> Self {
        Self { registry, endpoint }
    }

    /// Build a router for `nodes`.
    ///
    /// Paths that would collide once flattened are reported as
    /// [`RouteError::RouteConflict`] and nothing is built.
    pub fn build(&self, nodes: &[RouteNode]) -> Result<BuiltTree, RouteError> {
        check_paths(nodes)?;

        let mut stats = TreeStats::default();
        let (router, root) = self.build_level(nodes, &mut stats);
        Ok(BuiltTree {
            router,
            root,
            stats,
        })
    }

    fn build_level(
        &self,
        nodes: &[RouteNode],
        stats: &mut TreeStats,
    ) -> (Router, Option<MethodRouter>) {
        let mut router = Router::new();
        let mut root = None;

        for node in nodes {
            let chain = self.registry.resolve(node.middleware());

            router = match node {
                RouteNode::Internal {
                    pattern, children, ..
                } => {
                    let (child, child_root) = self.build_level(children, stats);
                    let child = chain.apply_to_router(child);
                    let child_root = child_root.map(|route| chain.apply_to_route(route));
                    stats.mounts += 1;
                    tracing::trace!(
                        pattern = %pattern,
                        middleware = ?chain.names(),
                        "Mount point"
                    );

                    if pattern == "/" {
                        root = root.or(child_root);
                        router.merge(child)
                    } else {
                        let router = router.nest(pattern, child);
                        match child_root {
                            Some(route) => router.route(&format!("{}/", pattern), route),
                            None => router,
                        }
                    }
                }
                RouteNode::Leaf { pattern, .. } => {
                    stats.bindings += 1;
                    tracing::trace!(
                        pattern = %pattern,
                        middleware = ?chain.names(),
                        "Leaf binding"
                    );

                    let route = chain.apply_to_route(self.endpoint.clone());
                    if pattern == "/" {
                        root = Some(route.clone());
                    }
                    router.route(pattern, route)
                }
            };
        }

        (router, root)
    }
}

/// Insert every flattened path into a matcher, reporting the first pair that
/// cannot coexist.
fn check_paths(nodes: &[RouteNode]) -> Result<(), RouteError> {
    let mut paths = Vec::new();
    flatten("", nodes, &mut paths);

    let mut matcher = matchit::Router::new();
    for path in paths {
        if let Err(e) = matcher.insert(path.clone(), ()) {
            return Err(RouteError::RouteConflict {
                pattern: path,
                reason: e.to_string(),
            });
        }
    }
    Ok(())
}

/// Full paths as axum registers them once nested routers are flattened.
fn flatten(base: &str, nodes: &[RouteNode], paths: &mut Vec<String>) {
    for node in nodes {
        match node {
            RouteNode::Internal {
                pattern, children, ..
            } => {
                if pattern == "/" {
                    flatten(base, children, paths);
                    continue;
                }
                let mount = format!("{}{}", base, pattern);
                flatten(&mount, children, paths);
                if has_root(children) {
                    paths.push(format!("{}/", mount));
                }
            }
            RouteNode::Leaf { pattern, .. } => paths.push(join(base, pattern)),
        }
    }
}

/// Whether `nodes` bind `/`, directly or through `/` mounts.
fn has_root(nodes: &[RouteNode]) -> bool {
    nodes.iter().any(|node| match node {
        RouteNode::Leaf { pattern, .. } => pattern == "/",
        RouteNode::Internal {
            pattern, children, ..
        } => pattern == "/" && has_root(children),
    })
}

fn join(base: &str, pattern: &str) -> String {
    match (base, pattern) {
        ("", pattern) => pattern.to_string(),
        (base, "/") => base.to_string(),
        (base, pattern) => format!("{}{}", base, pattern),
    }
}
