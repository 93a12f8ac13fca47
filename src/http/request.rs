//! Intercepted request capture.
//!
//! # Responsibilities
//! - Buffer one intercepted request into an owned, cloneable value
//! - Reconstruct the absolute target URL (proxy-form URI, or Host header
//!   for origin-form requests)
//! - Carry the request ID assigned at the edge
//!
//! # Design Decisions
//! - The body is buffered up front: handlers and the passthrough fallback
//!   may both need it, and the platform request can only be consumed once
//! - The original request is never mutated; forwarding builds a fresh copy

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request};
use bytes::Bytes;
use url::Url;
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Upper bound on buffered request bodies.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Error type for request capture.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("request has no Host header and no absolute URI")]
    MissingHost,
    #[error("could not reconstruct request URL: {0}")]
    InvalidUrl(String),
    #[error("failed to buffer request body: {0}")]
    BodyRead(String),
}

/// An intercepted request: method, absolute URL, headers, buffered body.
///
/// One instance per interception event, shared by every router attempt via
/// `Arc`.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    id: String,
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Bytes,
}

impl InterceptedRequest {
    /// Buffer an incoming platform request into an owned value.
    pub async fn capture(request: Request<Body>) -> Result<Self, CaptureError> {
        let (parts, body) = request.into_parts();

        let id = parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let url = Self::target_url(&parts.uri, &parts.headers)?;

        let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| CaptureError::BodyRead(e.to_string()))?;

        Ok(Self {
            id,
            method: parts.method,
            url,
            headers: parts.headers,
            body,
        })
    }

    /// Reconstruct the absolute target URL.
    ///
    /// Proxy-form requests carry an absolute URI already. Origin-form
    /// requests (a client pointed straight at the listener) fall back to
    /// the Host header, assuming plain HTTP.
    fn target_url(uri: &axum::http::Uri, headers: &HeaderMap) -> Result<Url, CaptureError> {
        if uri.scheme().is_some() && uri.authority().is_some() {
            return Url::parse(&uri.to_string())
                .map_err(|e| CaptureError::InvalidUrl(e.to_string()));
        }

        let host = headers
            .get(axum::http::header::HOST)
            .and_then(|h| h.to_str().ok())
            .ok_or(CaptureError::MissingHost)?;

        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        Url::parse(&format!("http://{}{}", host, path_and_query))
            .map_err(|e| CaptureError::InvalidUrl(e.to_string()))
    }

    /// Build an intercepted request directly. Used by tests and embedders
    /// that synthesize interception events.
    pub fn synthetic(method: Method, url: Url, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            method,
            url,
            headers,
            body,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}
