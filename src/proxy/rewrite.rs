//! Upstream path rewriting.
//!
//! Requests reach a service as `/{prefix}/{rest...}` relative to the services
//! namespace. Backends that do not know about the gateway want `/{rest...}`;
//! backends that also serve under their own name want the path unchanged.

/// Map a namespace-relative request path to the path sent upstream.
///
/// The leading empty segment is dropped, then (unless `preserve_service_name`)
/// the service segment after it. The remaining segments are joined as a rooted
/// path: empty and `.` segments are skipped, `..` pops the previous segment but
/// never climbs above `/`, and trailing slashes are not kept.
pub fn rewrite_path(path: &str, preserve_service_name: bool) -> String {
    let mut segments = path.split('/').peekable();

    if segments.peek() == Some(&"") {
        segments.next();
    }
    if !preserve_service_name {
        segments.next();
    }

    let mut joined: Vec<&str> = Vec::new();
    for segment in segments {
        match segment {
            "" | "." => {}
            ".." => {
                joined.pop();
            }
            other => joined.push(other),
        }
    }

    format!("/{}", joined.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_service_segment() {
        assert_eq!(rewrite_path("/svc/x/y", false), "/x/y");
        assert_eq!(rewrite_path("/svc/ping", false), "/ping");
    }

    #[test]
    fn test_preserve_service_segment() {
        assert_eq!(rewrite_path("/svc/x/y", true), "/svc/x/y");
        assert_eq!(rewrite_path("/svc", true), "/svc");
    }

    #[test]
    fn test_bare_paths_collapse_to_root() {
        assert_eq!(rewrite_path("/", false), "/");
        assert_eq!(rewrite_path("/", true), "/");
        assert_eq!(rewrite_path("/svc", false), "/");
        assert_eq!(rewrite_path("/svc/", false), "/");
        assert_eq!(rewrite_path("", false), "/");
    }

    #[test]
    fn test_join_semantics() {
        // Empty segments disappear in the join.
        assert_eq!(rewrite_path("/svc//a///b", false), "/a/b");
        assert_eq!(rewrite_path("/svc/a/", false), "/a");
        assert_eq!(rewrite_path("/svc/./a", false), "/a");
        assert_eq!(rewrite_path("/svc/a/../b", false), "/b");
        assert_eq!(rewrite_path("/svc/../../etc", false), "/etc");
    }

    #[test]
    fn test_relative_input_without_leading_slash() {
        // No leading empty segment: the first segment is the service name.
        assert_eq!(rewrite_path("svc/a", false), "/a");
        assert_eq!(rewrite_path("svc/a", true), "/svc/a");
    }
}
