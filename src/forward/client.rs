//! Passthrough client for unintercepted network requests.
//!
//! # Responsibilities
//! - Issue a real network request for an intercepted event
//! - Clone method/headers/body from the original unless overridden
//! - Strip hop-by-hop headers, propagate the request ID
//!
//! # Design Decisions
//! - The client dials origins directly; it never traverses the
//!   interception listener, so forwarding cannot re-trigger interception
//! - Credentials (cookies, authorization headers) are forwarded as-is
//! - Upstream failures surface as errors; callers decide the response

use std::time::Duration;

use axum::body::Body;
use axum::http::header::HOST;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Response, Uri};
use bytes::Bytes;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use url::Url;

use crate::http::request::{InterceptedRequest, X_REQUEST_ID};

/// Hop-by-hop headers that must not be forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Error type for passthrough forwarding.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid forward target {url:?}: {message}")]
    InvalidTarget { url: String, message: String },
    #[error("failed to build forward request: {0}")]
    Build(String),
    #[error("upstream request failed: {0}")]
    Upstream(String),
}

/// Overrides applied when forwarding, in place of the original request's
/// own method/headers/body/target.
#[derive(Debug, Clone, Default)]
pub struct ForwardOverrides {
    pub url: Option<Url>,
    pub method: Option<Method>,
    pub headers: Option<HeaderMap>,
    pub body: Option<Bytes>,
}

/// Client that performs real, unintercepted network requests.
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
}

impl Forwarder {
    /// Create a forwarder with the given connect timeout.
    pub fn new(connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }

    /// Fetch the original request (or an overridden variant) from the real
    /// network.
    pub async fn fetch(
        &self,
        request: &InterceptedRequest,
        overrides: ForwardOverrides,
    ) -> Result<Response<Body>, ForwardError> {
        let url = overrides.url.unwrap_or_else(|| request.url().clone());
        let method = overrides.method.unwrap_or_else(|| request.method().clone());
        let headers = overrides
            .headers
            .unwrap_or_else(|| request.headers().clone());
        let body = overrides.body.unwrap_or_else(|| request.body().clone());

        let uri: Uri = url.as_str().parse().map_err(|e| ForwardError::InvalidTarget {
            url: url.to_string(),
            message: format!("{}", e),
        })?;

        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(forward_headers) = builder.headers_mut() {
            for (name, value) in headers.iter() {
                if !is_hop_by_hop(name) {
                    forward_headers.insert(name.clone(), value.clone());
                }
            }
            // Let the client derive Host from the target; a stale Host
            // header breaks overridden destinations.
            forward_headers.remove(HOST);
            if let Ok(id) = HeaderValue::from_str(request.id()) {
                forward_headers.insert(X_REQUEST_ID, id);
            }
        }

        let forward_request = builder
            .body(Body::from(body))
            .map_err(|e| ForwardError::Build(e.to_string()))?;

        tracing::debug!(
            request_id = %request.id(),
            url = %url,
            "Forwarding to the real network"
        );

        let response = self
            .client
            .request(forward_request)
            .await
            .map_err(|e| ForwardError::Upstream(e.to_string()))?;

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
