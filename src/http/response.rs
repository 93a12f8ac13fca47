//! Response accumulation and deferred resolution.
//!
//! # Responsibilities
//! - Accumulate status, headers, and body for one intercepted request
//! - Resolve the request's deferred completion signal exactly once
//! - Guarantee completion even when a handler never finishes (safety timer)
//!
//! # Data Flow
//! ```text
//! handler chain ──┐
//! global fallback ─┼──▶ first resolve wins ──▶ oneshot ──▶ dispatcher reply
//! safety timer ───┘
//! ```
//!
//! # Design Decisions
//! - `PENDING → RESOLVED`, terminal; late resolutions are silently ignored
//! - The writer is cheap to clone; all clones share one resolution slot
//! - The safety timer forwards to the real network rather than erroring:
//!   a misbehaving handler must look like "no mock configured"

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method, Response, StatusCode};
use bytes::Bytes;
use serde::Serialize;
use tokio::sync::{oneshot, watch};

use crate::forward::{ForwardOverrides, Forwarder};
use crate::http::mime;
use crate::http::request::InterceptedRequest;

/// Status codes that never carry a body.
const BODYLESS_STATUSES: [u16; 4] = [101, 204, 205, 304];

/// Identifying header seeded on every mocked response.
pub const X_POWERED_BY: &str = "x-powered-by";

/// Canonical reason phrase for a status, or the stringified code when the
/// status has no registered text.
pub fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}

/// Error type for response construction.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("unsupported response body shape")]
    UnsupportedBody,
    #[error("failed to serialize JSON body: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Tagged response payload accepted by [`ResponseWriter::send`].
///
/// Callers with static types convert infallibly via `From`; dynamic JSON
/// values go through [`SendBody::from_value`], the one place a shape can be
/// rejected.
#[derive(Debug, Clone)]
pub enum SendBody {
    /// Plain text, served as HTML unless a content type was set.
    Text(String),
    /// Raw bytes with an optional intrinsic content type.
    Binary {
        data: Bytes,
        content_type: Option<String>,
    },
    /// A JSON-able value, serialized at finalization.
    Json(serde_json::Value),
}

impl SendBody {
    /// Construct a binary payload carrying its own content type.
    pub fn binary_with_type(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        SendBody::Binary {
            data: data.into(),
            content_type: Some(content_type.into()),
        }
    }

    /// Dispatch a dynamic JSON value into a payload.
    ///
    /// Strings become text, objects/arrays/numbers/booleans stay JSON, and
    /// `null` is rejected: there is no meaningful response for it.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ResponseError> {
        match value {
            serde_json::Value::String(s) => Ok(SendBody::Text(s)),
            serde_json::Value::Null => Err(ResponseError::UnsupportedBody),
            other => Ok(SendBody::Json(other)),
        }
    }
}

impl From<&str> for SendBody {
    fn from(value: &str) -> Self {
        SendBody::Text(value.to_string())
    }
}

impl From<String> for SendBody {
    fn from(value: String) -> Self {
        SendBody::Text(value)
    }
}

impl From<Bytes> for SendBody {
    fn from(data: Bytes) -> Self {
        SendBody::Binary {
            data,
            content_type: None,
        }
    }
}

impl From<Vec<u8>> for SendBody {
    fn from(data: Vec<u8>) -> Self {
        Bytes::from(data).into()
    }
}

impl From<bool> for SendBody {
    fn from(value: bool) -> Self {
        SendBody::Json(value.into())
    }
}

impl From<i64> for SendBody {
    fn from(value: i64) -> Self {
        SendBody::Json(value.into())
    }
}

impl From<u64> for SendBody {
    fn from(value: u64) -> Self {
        SendBody::Json(value.into())
    }
}

impl From<f64> for SendBody {
    fn from(value: f64) -> Self {
        SendBody::Json(value.into())
    }
}

/// Mutable response description. Guarded by `Inner::state`.
struct ResponseState {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: Option<SendBody>,
}

struct Inner {
    request: Arc<InterceptedRequest>,
    forwarder: Arc<Forwarder>,
    state: Mutex<ResponseState>,
    /// Single-use resolution slot; `take()` is the idempotence guard.
    resolver: Mutex<Option<oneshot::Sender<Response<Body>>>>,
    settled: watch::Sender<bool>,
    /// Some route entry matched this request syntactically. Best-effort
    /// signal: the global fallback stands down and leaves the request to
    /// the matching handler (and the safety timer behind it).
    matched: std::sync::atomic::AtomicBool,
}

/// Accumulates one response and resolves its deferred completion signal.
///
/// One writer per intercepted request, cloned into every router attempt and
/// both backstop timers. The first terminal call (`end`, `json`, `send`,
/// `send_status`, `forward`) wins; everything after is a no-op.
#[derive(Clone)]
pub struct ResponseWriter {
    inner: Arc<Inner>,
}

impl ResponseWriter {
    /// Create a writer for `request` and arm its safety timer.
    ///
    /// Returns the writer and the receiving half of the completion signal.
    /// The receiver must be obtained before any asynchronous work starts so
    /// the platform always holds a pending result.
    pub fn new(
        request: Arc<InterceptedRequest>,
        forwarder: Arc<Forwarder>,
        safety_timeout: Duration,
    ) -> (Self, oneshot::Receiver<Response<Body>>) {
        let (resolve_tx, resolve_rx) = oneshot::channel();
        let (settled_tx, mut settled_rx) = watch::channel(false);

        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            HeaderName::from_static(X_POWERED_BY),
            HeaderValue::from_static("mock-proxy"),
        );

        let writer = Self {
            inner: Arc::new(Inner {
                request,
                forwarder,
                state: Mutex::new(ResponseState {
                    status: StatusCode::OK,
                    headers,
                    body: None,
                }),
                resolver: Mutex::new(Some(resolve_tx)),
                settled: settled_tx,
                matched: std::sync::atomic::AtomicBool::new(false),
            }),
        };

        let timer = writer.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(safety_timeout) => {
                    if !timer.is_resolved() {
                        tracing::warn!(
                            request_id = %timer.inner.request.id(),
                            url = %timer.inner.request.url(),
                            timeout_ms = safety_timeout.as_millis() as u64,
                            "Response never finalized, forwarding original request"
                        );
                        timer.forward().await;
                    }
                }
                _ = settled_rx.changed() => {}
            }
        });

        (writer, resolve_rx)
    }

    /// The intercepted request this writer belongs to.
    pub fn request(&self) -> &Arc<InterceptedRequest> {
        &self.inner.request
    }

    /// Record that a route entry matched this request syntactically.
    pub fn mark_matched(&self) {
        self.inner
            .matched
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Whether any route entry has matched this request syntactically.
    pub fn was_matched(&self) -> bool {
        self.inner
            .matched
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Whether the completion signal has already been resolved.
    pub fn is_resolved(&self) -> bool {
        self.inner
            .resolver
            .lock()
            .expect("resolver lock poisoned")
            .is_none()
    }

    /// Set the response status. Chainable.
    ///
    /// Out-of-range codes are logged and ignored rather than rejected.
    pub fn status(&self, code: u16) -> &Self {
        if self.is_resolved() {
            return self;
        }
        match StatusCode::from_u16(code) {
            Ok(status) => {
                self.lock_state().status = status;
            }
            Err(_) => {
                tracing::warn!(code, "Ignoring out-of-range status code");
            }
        }
        self
    }

    /// Set a response header. Chainable.
    pub fn header(&self, name: &str, value: &str) -> &Self {
        if self.is_resolved() {
            return self;
        }
        match (
            HeaderName::try_from(name),
            HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.lock_state().headers.insert(name, value);
            }
            _ => {
                tracing::warn!(header = name, "Ignoring invalid response header");
            }
        }
        self
    }

    /// Set the content type. Tokens without `/` are resolved through the
    /// MIME database (`"json"` → `application/json`). Chainable.
    pub fn type_(&self, token: &str) -> &Self {
        self.header(CONTENT_TYPE.as_str(), &mime::lookup(token))
    }

    /// Serialize `body` as JSON and finalize the response.
    pub fn json<T: Serialize + ?Sized>(&self, body: &T) -> Result<(), ResponseError> {
        if self.is_resolved() {
            return Ok(());
        }
        let value = serde_json::to_value(body)?;
        {
            let mut state = self.lock_state();
            if !state.headers.contains_key(CONTENT_TYPE) {
                state
                    .headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            state.body = Some(SendBody::Json(value));
        }
        self.end();
        Ok(())
    }

    /// Set the body from a tagged payload and finalize the response.
    pub fn send(&self, body: impl Into<SendBody>) {
        self.send_body(body.into());
    }

    fn send_body(&self, body: SendBody) {
        if self.is_resolved() {
            return;
        }
        {
            let mut state = self.lock_state();
            if !state.headers.contains_key(CONTENT_TYPE) {
                let content_type = match &body {
                    SendBody::Text(_) => Some("text/html".to_string()),
                    SendBody::Json(_) => Some("application/json".to_string()),
                    SendBody::Binary { content_type, .. } => Some(
                        content_type
                            .clone()
                            .unwrap_or_else(|| "application/octet-stream".to_string()),
                    ),
                };
                if let Some(ct) = content_type.and_then(|ct| HeaderValue::try_from(ct).ok()) {
                    state.headers.insert(CONTENT_TYPE, ct);
                }
            }
            state.body = Some(body);
        }
        self.end();
    }

    /// Set the status and send its canonical text as a plain-text body.
    pub fn send_status(&self, code: u16) {
        if self.is_resolved() {
            return;
        }
        self.status(code);
        {
            let mut state = self.lock_state();
            let text = status_text(state.status);
            state
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
            state.body = Some(SendBody::Text(text));
        }
        self.end();
    }

    /// Finalize the accumulated response and resolve the completion signal.
    ///
    /// Bodyless statuses and HEAD requests drop any accumulated body; a
    /// missing content type defaults to `text/plain`. No-op once resolved.
    pub fn end(&self) {
        if self.is_resolved() {
            return;
        }
        let response = {
            let mut state = self.lock_state();

            let drop_body = BODYLESS_STATUSES.contains(&state.status.as_u16())
                || self.inner.request.method() == Method::HEAD;
            if drop_body {
                state.body = None;
            }
            if !state.headers.contains_key(CONTENT_TYPE) {
                state
                    .headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
            }

            let bytes = match state.body.take() {
                None => Bytes::new(),
                Some(SendBody::Text(s)) => Bytes::from(s),
                Some(SendBody::Binary { data, .. }) => data,
                Some(SendBody::Json(value)) => match serde_json::to_vec(&value) {
                    Ok(b) => Bytes::from(b),
                    Err(error) => {
                        tracing::error!(
                            request_id = %self.inner.request.id(),
                            error = %error,
                            "Failed to serialize JSON body at finalization"
                        );
                        Bytes::new()
                    }
                },
            };

            let mut builder = Response::builder().status(state.status);
            if let Some(headers) = builder.headers_mut() {
                *headers = state.headers.clone();
            }
            builder.body(Body::from(bytes))
        };

        match response {
            Ok(response) => self.resolve(response),
            Err(error) => {
                tracing::error!(
                    request_id = %self.inner.request.id(),
                    error = %error,
                    "Failed to assemble response"
                );
                let mut fallback = Response::new(Body::empty());
                *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                self.resolve(fallback);
            }
        }
    }

    /// Resolve with a real, unintercepted fetch of the original request.
    pub async fn forward(&self) {
        self.forward_with(ForwardOverrides::default()).await;
    }

    /// Resolve with a real network fetch, overriding parts of the original
    /// request (destination, method, headers, body).
    pub async fn forward_with(&self, overrides: ForwardOverrides) {
        if self.is_resolved() {
            return;
        }
        match self.inner.forwarder.fetch(&self.inner.request, overrides).await {
            Ok(response) => self.resolve(response),
            Err(error) => {
                tracing::error!(
                    request_id = %self.inner.request.id(),
                    url = %self.inner.request.url(),
                    error = %error,
                    "Passthrough request failed"
                );
                let mut response = Response::new(Body::from("Upstream request failed"));
                *response.status_mut() = StatusCode::BAD_GATEWAY;
                self.resolve(response);
            }
        }
    }

    /// First resolution wins; the taken sender is the idempotence guard.
    fn resolve(&self, response: Response<Body>) {
        let sender = self
            .inner
            .resolver
            .lock()
            .expect("resolver lock poisoned")
            .take();

        if let Some(tx) = sender {
            // The receiver may be gone if the platform side was dropped;
            // the response is discarded in that case.
            let _ = tx.send(response);
            let _ = self.inner.settled.send(true);
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ResponseState> {
        self.inner.state.lock().expect("response state lock poisoned")
    }
}
