//! Compiled route trees.
//!
//! A service's `routes` list is compiled into [`RouteNode`]s before anything is
//! mounted. Internal and leaf nodes are distinct variants so the builder can
//! never treat one as the other.

use std::collections::HashMap;

use crate::config::ServiceConfigRoute;
use crate::routing::pattern::{normalize_leaf, normalize_mount, shape, RouteError};

/// One node of a compiled route tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteNode {
    /// A mount point: a sub-router at `pattern` holding `children`.
    Internal {
        pattern: String,
        middleware: Vec<String>,
        children: Vec<RouteNode>,
    },
    /// A terminal binding of `pattern` to the service's proxy.
    Leaf {
        pattern: String,
        middleware: Vec<String>,
    },
}

impl RouteNode {
    pub fn pattern(&self) -> &str {
        match self {
            RouteNode::Internal { pattern, .. } | RouteNode::Leaf { pattern, .. } => pattern,
        }
    }

    pub fn middleware(&self) -> &[String] {
        match self {
            RouteNode::Internal { middleware, .. } | RouteNode::Leaf { middleware, .. } => {
                middleware
            }
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, RouteNode::Leaf { .. })
    }
}

/// Number of mount points and leaf bindings in a compiled tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub mounts: usize,
    pub bindings: usize,
}

impl TreeStats {
    pub fn of(nodes: &[RouteNode]) -> Self {
        let mut stats = Self::default();
        for node in nodes {
            match node {
                RouteNode::Internal { children, .. } => {
                    let nested = Self::of(children);
                    stats.mounts += 1 + nested.mounts;
                    stats.bindings += nested.bindings;
                }
                RouteNode::Leaf { .. } => stats.bindings += 1,
            }
        }
        stats
    }
}

/// Compile configured routes into a tree, normalizing patterns and rejecting
/// siblings that would collide in the router.
pub fn compile_routes(routes: &[ServiceConfigRoute]) -> Result<Vec<RouteNode>, RouteError> {
    let mut nodes = Vec::with_capacity(routes.len());
    let mut seen: HashMap<String, String> = HashMap::new();

    for route in routes {
        let node = if route.routes.is_empty() {
            RouteNode::Leaf {
                pattern: normalize_leaf(&route.pattern)?,
                middleware: route.middleware.clone(),
            }
        } else {
            RouteNode::Internal {
                pattern: normalize_mount(&route.pattern)?,
                middleware: route.middleware.clone(),
                children: compile_routes(&route.routes)?,
            }
        };

        // A mount at "/" merges into its parent, so its children share the
        // parent's namespace.
        if let RouteNode::Internal { pattern, children, .. } = &node {
            if pattern == "/" {
                for child in children {
                    claim(&mut seen, child.pattern(), &route.pattern)?;
                }
                nodes.push(node);
                continue;
            }
        }

        claim(&mut seen, node.pattern(), &route.pattern)?;
        nodes.push(node);
    }

    Ok(nodes)
}

fn claim(seen: &mut HashMap<String, String>, pattern: &str, raw: &str) -> Result<(), RouteError> {
    if let Some(previous) = seen.insert(shape(pattern), raw.to_string()) {
        return Err(RouteError::RouteConflict {
            pattern: raw.to_string(),
            reason: format!("collides with sibling '{}'", previous),
        });
    }
    Ok(())
}
