//! Path pattern normalization.
//!
//! Patterns arrive in the chi style operators already use (`/{id}`, `/*`) and
//! are normalized to what axum accepts. axum panics on malformed or colliding
//! paths, so everything a configuration can get wrong is rejected here first.

/// Errors in route patterns or service prefixes.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("invalid prefix '{prefix}': {reason}")]
    InvalidPrefix { prefix: String, reason: &'static str },

    #[error("route conflict at '{pattern}': {reason}")]
    RouteConflict { pattern: String, reason: String },
}

const CATCH_ALL: &str = "{*wildcard}";

/// Normalize a leaf pattern.
pub fn normalize_leaf(raw: &str) -> Result<String, RouteError> {
    normalize(raw)
}

/// Normalize a mount pattern. Mounts match everything beneath them, so they
/// may not end in a catch-all and their trailing slash is dropped.
pub fn normalize_mount(raw: &str) -> Result<String, RouteError> {
    let pattern = normalize(raw)?;
    if pattern.ends_with(CATCH_ALL) {
        return Err(RouteError::InvalidPattern {
            pattern: raw.to_string(),
            reason: "a route with child routes cannot end in a wildcard",
        });
    }
    match pattern.trim_end_matches('/') {
        "" => Ok("/".to_string()),
        trimmed => Ok(trimmed.to_string()),
    }
}

/// Normalize a service prefix: a single literal segment such as `/users`.
pub fn normalize_prefix(raw: &str) -> Result<String, RouteError> {
    let invalid = |reason| RouteError::InvalidPrefix {
        prefix: raw.to_string(),
        reason,
    };

    if !raw.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    let name = raw.trim_end_matches('/').trim_start_matches('/');
    if name.is_empty() {
        return Err(invalid("must name a service and cannot be '/'"));
    }
    if name.contains('/') {
        return Err(invalid("must be a single path segment"));
    }
    if name.contains(['{', '}', '*', ':', '?', '#']) {
        return Err(invalid("must be a literal segment"));
    }
    Ok(format!("/{}", name))
}

/// Shape of a normalized pattern with parameter names erased, used to detect
/// siblings the router would treat as the same path.
pub fn shape(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| {
            if segment.starts_with("{*") {
                "{*}"
            } else if segment.starts_with('{') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn normalize(raw: &str) -> Result<String, RouteError> {
    let invalid = |reason| RouteError::InvalidPattern {
        pattern: raw.to_string(),
        reason,
    };

    if raw.is_empty() {
        return Err(invalid("pattern is empty"));
    }
    if !raw.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }

    let segments: Vec<&str> = raw[1..].split('/').collect();
    let last = segments.len() - 1;
    let mut normalized = Vec::with_capacity(segments.len());

    for (i, segment) in segments.iter().enumerate() {
        let segment = match *segment {
            "*" => CATCH_ALL,
            s if s.starts_with(':') => {
                return Err(invalid("use '{name}' for parameters, not ':name'"))
            }
            s if s.starts_with("{*") => {
                if !s.ends_with('}') || s.len() < 4 {
                    return Err(invalid("malformed wildcard"));
                }
                s
            }
            s if s.starts_with('{') => {
                if !s.ends_with('}') || s.len() < 3 || s[1..s.len() - 1].contains(['{', '}', '*']) {
                    return Err(invalid("malformed parameter"));
                }
                s
            }
            s if s.contains(['{', '}', '*']) => {
                return Err(invalid("wildcards and parameters must span a whole segment"))
            }
            s => s,
        };
        if segment.starts_with("{*") && i != last {
            return Err(invalid("wildcard must be the last segment"));
        }
        normalized.push(segment);
    }

    Ok(format!("/{}", normalized.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_leaf() {
        assert_eq!(normalize_leaf("/ping").unwrap(), "/ping");
        assert_eq!(normalize_leaf("/").unwrap(), "/");
        assert_eq!(normalize_leaf("/users/{id}").unwrap(), "/users/{id}");
        assert_eq!(normalize_leaf("/files/*").unwrap(), "/files/{*wildcard}");
        assert_eq!(normalize_leaf("/*").unwrap(), "/{*wildcard}");
        assert_eq!(normalize_leaf("/files/{*rest}").unwrap(), "/files/{*rest}");
    }

    #[test]
    fn test_normalize_leaf_rejects() {
        for raw in ["", "ping", "/users/:id", "/files/*/meta", "/a{b}", "/{}", "/{*}", "/{id"] {
            assert!(
                matches!(normalize_leaf(raw), Err(RouteError::InvalidPattern { .. })),
                "expected {:?} to be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_normalize_mount() {
        assert_eq!(normalize_mount("/v1/").unwrap(), "/v1");
        assert_eq!(normalize_mount("/").unwrap(), "/");
        assert_eq!(normalize_mount("/users/{id}").unwrap(), "/users/{id}");
        assert!(normalize_mount("/files/*").is_err());
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("/svc").unwrap(), "/svc");
        assert_eq!(normalize_prefix("/svc/").unwrap(), "/svc");

        for raw in ["", "svc", "/", "//", "/a/b", "/{name}", "/*"] {
            assert!(
                matches!(normalize_prefix(raw), Err(RouteError::InvalidPrefix { .. })),
                "expected {:?} to be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_shape_erases_parameter_names() {
        assert_eq!(shape("/users/{id}"), shape("/users/{name}"));
        assert_eq!(shape("/files/{*a}"), shape("/files/{*b}"));
        assert_ne!(shape("/users/{id}"), shape("/users/me"));
    }
}
