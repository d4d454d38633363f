//! Reverse-proxy handler bound to a single backend origin.
//!
//! # Responsibilities
//! - Parse and hold the destination origin (scheme + authority)
//! - Rewrite the request path according to the service's prefix policy
//! - Strip hop-by-hop headers and add X-Forwarded-* headers
//! - Forward upstream and relay the response verbatim
//!
//! # Design Decisions
//! - One instance per service, shared via `Arc` by every route binding
//! - Only scheme and authority of the destination are used; its path is ignored
//! - Plain HTTP upstreams only (the shared connector does not speak TLS)

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::{
        header,
        uri::{Authority, Scheme},
        HeaderMap, HeaderName, HeaderValue, StatusCode, Uri, Version,
    },
    response::{IntoResponse, Response},
    routing::{any, MethodRouter},
};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use url::Url;

use crate::http::dispatch::NamespacePath;
use crate::observability::metrics;
use crate::proxy::rewrite::rewrite_path;

/// Shared upstream HTTP client.
pub type HttpClient = Client<HttpConnector, Body>;

const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Headers that apply to a single connection and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Errors raised while constructing a proxy.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("malformed destination '{destination}': {reason}")]
    MalformedDestination { destination: String, reason: String },
}

/// A parsed backend origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    scheme: Scheme,
    authority: Authority,
}

impl Destination {
    /// Parse an absolute `http://host[:port]` URL.
    pub fn parse(raw: &str) -> Result<Self, ProxyError> {
        let malformed = |reason: String| ProxyError::MalformedDestination {
            destination: raw.to_string(),
            reason,
        };

        let url = Url::parse(raw).map_err(|e| malformed(e.to_string()))?;
        // TODO: accept https once the shared client uses a hyper-rustls connector.
        if url.scheme() != "http" {
            return Err(malformed(format!("unsupported scheme '{}'", url.scheme())));
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| malformed("missing host".to_string()))?;

        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority).map_err(|e| malformed(e.to_string()))?;

        Ok(Self {
            scheme: Scheme::HTTP,
            authority,
        })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

/// Reverse proxy for one registered service.
#[derive(Debug)]
pub struct ReverseProxy {
    destination: Destination,
    preserve_service_name: bool,
    client: HttpClient,
    upstream_timeout: Duration,
    label: String,
}

impl ReverseProxy {
    /// Build a proxy forwarding to `destination`.
    pub fn new(
        destination: &str,
        preserve_service_name: bool,
        client: HttpClient,
    ) -> Result<Self, ProxyError> {
        let destination = Destination::parse(destination)?;
        Ok(Self {
            label: destination.authority.to_string(),
            destination,
            preserve_service_name,
            client,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        })
    }

    /// Bound a single upstream round-trip.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Name used in logs and metric labels (the service prefix).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Compute the upstream URI for a namespace-relative path and query.
    pub fn upstream_uri(&self, path: &str, query: Option<&str>) -> Result<Uri, axum::http::Error> {
        let path = rewrite_path(path, self.preserve_service_name);
        let path_and_query = match query {
            Some(q) => format!("{}?{}", path, q),
            None => path,
        };

        Uri::builder()
            .scheme(self.destination.scheme.clone())
            .authority(self.destination.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }

    /// Wrap this proxy as a method-agnostic route endpoint.
    pub fn into_endpoint(self: Arc<Self>) -> MethodRouter {
        any(move |request: Request| {
            let proxy = self.clone();
            async move { proxy.forward(request).await }
        })
    }

    /// Forward a request upstream and relay the response.
    pub async fn forward(&self, request: Request) -> Response {
        let start_time = Instant::now();
        let (mut parts, body) = request.into_parts();

        let path = parts
            .extensions
            .get::<NamespacePath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let uri = match self.upstream_uri(&path, parts.uri.query()) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!(
                    service = %self.label,
                    path = %path,
                    error = %e,
                    "Cannot build upstream URI"
                );
                metrics::record_proxy_request(&self.label, 400, start_time);
                return (StatusCode::BAD_REQUEST, "Invalid request path").into_response();
            }
        };

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let inbound_host = parts.headers.remove(header::HOST);

        strip_hop_by_hop(&mut parts.headers);
        set_forwarded_headers(&mut parts.headers, peer, inbound_host);

        tracing::debug!(
            service = %self.label,
            method = %parts.method,
            path = %path,
            upstream = %uri,
            "Forwarding request"
        );

        parts.uri = uri;
        parts.version = Version::HTTP_11;
        let upstream_request = Request::from_parts(parts, body);

        let upstream = self.client.request(upstream_request);
        match tokio::time::timeout(self.upstream_timeout, upstream).await {
            Ok(Ok(response)) => {
                let (mut parts, body) = response.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                metrics::record_proxy_request(&self.label, parts.status.as_u16(), start_time);
                Response::from_parts(parts, Body::new(body))
            }
            Ok(Err(e)) => {
                tracing::error!(
                    service = %self.label,
                    destination = %self.destination,
                    error = %e,
                    "Upstream error"
                );
                metrics::record_proxy_request(&self.label, 502, start_time);
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
            Err(_) => {
                tracing::error!(
                    service = %self.label,
                    destination = %self.destination,
                    timeout = ?self.upstream_timeout,
                    "Upstream timed out"
                );
                metrics::record_proxy_request(&self.label, 504, start_time);
                (StatusCode::GATEWAY_TIMEOUT, "Upstream request timed out").into_response()
            }
        }
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers named by `Connection` are connection-scoped as well.
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_str(name.trim()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

fn set_forwarded_headers(
    headers: &mut HeaderMap,
    peer: Option<SocketAddr>,
    host: Option<HeaderValue>,
) {
    if let Some(addr) = peer {
        let client_ip = addr.ip().to_string();
        let forwarded_for = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(prior) => format!("{}, {}", prior, client_ip),
            None => client_ip,
        };
        if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }
    if let Some(host) = host {
        headers.insert(X_FORWARDED_HOST, host);
    }
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper_util::rt::TokioExecutor;

    fn client() -> HttpClient {
        Client::builder(TokioExecutor::new()).build(HttpConnector::new())
    }

    #[test]
    fn test_destination_parse() {
        let d = Destination::parse("http://backend.local").unwrap();
        assert_eq!(d.authority().as_str(), "backend.local");
        assert_eq!(d.to_string(), "http://backend.local");

        let d = Destination::parse("http://127.0.0.1:8100/ignored/path?q=1").unwrap();
        assert_eq!(d.authority().as_str(), "127.0.0.1:8100");
    }

    #[test]
    fn test_destination_rejects_malformed() {
        for raw in [
            "",
            "not a url",
            "/relative/path",
            "backend.local:8080",
            "https://secure.local",
            "http://",
        ] {
            assert!(
                matches!(Destination::parse(raw), Err(ProxyError::MalformedDestination { .. })),
                "expected {:?} to be rejected",
                raw
            );
        }
    }

    #[tokio::test]
    async fn test_upstream_uri() {
        let proxy = ReverseProxy::new("http://backend.local", false, client()).unwrap();
        let uri = proxy.upstream_uri("/svc/ping", None).unwrap();
        assert_eq!(uri.to_string(), "http://backend.local/ping");

        let uri = proxy.upstream_uri("/svc/a/b", Some("x=1&y=2")).unwrap();
        assert_eq!(uri.to_string(), "http://backend.local/a/b?x=1&y=2");

        let preserving = ReverseProxy::new("http://backend.local:9000", true, client()).unwrap();
        let uri = preserving.upstream_uri("/svc/x/y", None).unwrap();
        assert_eq!(uri.to_string(), "http://backend.local:9000/svc/x/y");
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("close, x-session"));
        headers.insert("x-session", HeaderValue::from_static("abc"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        strip_hop_by_hop(&mut headers);

        assert!(headers.get(header::CONNECTION).is_none());
        assert!(headers.get("x-session").is_none());
        assert!(headers.get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/plain");
    }

    #[test]
    fn test_forwarded_headers_append() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("10.0.0.1"));
        let peer: SocketAddr = "192.168.1.7:5000".parse().unwrap();

        let host = HeaderValue::from_static("gateway.local");
        set_forwarded_headers(&mut headers, Some(peer), Some(host));

        assert_eq!(headers.get(X_FORWARDED_FOR).unwrap(), "10.0.0.1, 192.168.1.7");
        assert_eq!(headers.get(X_FORWARDED_HOST).unwrap(), "gateway.local");
        assert_eq!(headers.get(X_FORWARDED_PROTO).unwrap(), "http");
    }
}
