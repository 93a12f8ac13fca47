//! Routers: ordered route/middleware tables scoped to a base URL.
//!
//! # Responsibilities
//! - Hold route entries in registration order
//! - Attempt to satisfy one intercepted request
//! - Contain handler failures (a broken handler must never take down the
//!   dispatcher)
//!
//! # Design Decisions
//! - Registration order is match-priority order; no reordering
//! - A handler that does not call `next.proceed()` ends this router's
//!   attempt; other routers are unaffected
//! - Routers register themselves into the process-wide registry at
//!   construction and are shared via `Arc`

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use axum::http::Method;
use futures_util::future::BoxFuture;
use url::Url;

use crate::http::request::InterceptedRequest;
use crate::http::response::ResponseWriter;
use crate::routing::matcher::{BaseMatcher, MethodMatcher, PathParams, PathPattern};
use crate::routing::registry;

/// Boxed error type handlers may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Future type produced by route handlers.
pub type HandlerFuture = BoxFuture<'static, Result<(), BoxError>>;

/// Type-erased route handler: `(request context, response writer, next)`.
pub type HandlerFn =
    Arc<dyn Fn(RequestContext, ResponseWriter, Next) -> HandlerFuture + Send + Sync>;

/// Per-invocation view of the intercepted request handed to handlers.
#[derive(Clone)]
pub struct RequestContext {
    /// The intercepted request (method, URL, headers, buffered body).
    pub request: Arc<InterceptedRequest>,
    /// Parameters bound by the matched path pattern.
    pub params: PathParams,
}

impl RequestContext {
    /// Look up a bound path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Continuation token handed to each handler.
///
/// Calling [`Next::proceed`] lets iteration continue with the following
/// matching entry in the same router; leaving it untouched stops there.
#[derive(Clone, Debug, Default)]
pub struct Next {
    called: Arc<AtomicBool>,
}

impl Next {
    pub fn proceed(&self) {
        self.called.store(true, Ordering::SeqCst);
    }

    fn was_called(&self) -> bool {
        self.called.load(Ordering::SeqCst)
    }
}

/// One registered route or middleware entry.
#[derive(Clone)]
struct RouteEntry {
    method: MethodMatcher,
    pattern: PathPattern,
    handler: HandlerFn,
}

/// Error type for router construction.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
}

/// An ordered collection of path/method-scoped handlers under one base URL.
pub struct Router {
    base_url: Url,
    base: BaseMatcher,
    entries: RwLock<Vec<RouteEntry>>,
}

impl Router {
    /// Create a router for `base_url` and register it globally.
    ///
    /// The dispatcher gives every registered router a chance at every
    /// intercepted request, in construction order.
    pub fn new(base_url: &str) -> Result<Arc<Self>, RouterError> {
        let url = Url::parse(base_url).map_err(|source| RouterError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;

        let router = Arc::new(Self {
            base: BaseMatcher::new(&url),
            base_url: url,
            entries: RwLock::new(Vec::new()),
        });
        registry::register(router.clone());

        tracing::debug!(base_url = %router.base_url, "Router registered");
        Ok(router)
    }

    /// The base URL this router is mounted on.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn push(&self, method: MethodMatcher, pattern: &str, handler: HandlerFn) -> &Self {
        self.entries
            .write()
            .expect("route entries lock poisoned")
            .push(RouteEntry {
                method,
                pattern: PathPattern::parse(pattern),
                handler,
            });
        self
    }

    fn wrap<H, Fut>(handler: H) -> HandlerFn
    where
        H: Fn(RequestContext, ResponseWriter, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Arc::new(move |ctx, writer, next| Box::pin(handler(ctx, writer, next)))
    }

    /// Register a middleware entry matching every method and path under
    /// this router's base URL. Chainable.
    pub fn use_<H, Fut>(&self, handler: H) -> &Self
    where
        H: Fn(RequestContext, ResponseWriter, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.push(MethodMatcher::Any, "*", Self::wrap(handler))
    }

    /// Register a method-and-pattern-scoped entry. Chainable.
    pub fn route<H, Fut>(&self, method: Method, pattern: &str, handler: H) -> &Self
    where
        H: Fn(RequestContext, ResponseWriter, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.push(MethodMatcher::Exact(method), pattern, Self::wrap(handler))
    }

    /// Register an entry matching any method on `pattern`. Chainable.
    pub fn all<H, Fut>(&self, pattern: &str, handler: H) -> &Self
    where
        H: Fn(RequestContext, ResponseWriter, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.push(MethodMatcher::Any, pattern, Self::wrap(handler))
    }

    /// Attempt to satisfy one intercepted request.
    ///
    /// Entries are tried in registration order. A handler error is reported
    /// and ends this router's attempt; the global fallback still guarantees
    /// the request completes. Returns whether at least one entry matched
    /// syntactically (a best-effort signal, not a correctness gate).
    pub async fn attempt_match(
        &self,
        request: Arc<InterceptedRequest>,
        writer: ResponseWriter,
    ) -> bool {
        let Some(rest) = self.base.strip(request.url()) else {
            return false;
        };

        let entries: Vec<RouteEntry> = self
            .entries
            .read()
            .expect("route entries lock poisoned")
            .clone();

        let mut matched_any = false;
        for entry in entries {
            if !entry.method.matches(request.method()) {
                continue;
            }
            let Some(params) = entry.pattern.matches(&rest) else {
                continue;
            };
            matched_any = true;
            writer.mark_matched();

            let ctx = RequestContext {
                request: request.clone(),
                params,
            };
            let next = Next::default();

            if let Err(error) = (entry.handler)(ctx, writer.clone(), next.clone()).await {
                tracing::error!(
                    request_id = %request.id(),
                    url = %request.url(),
                    error = %error,
                    "Route handler failed"
                );
                break;
            }
            if !next.was_called() {
                break;
            }
        }

        matched_any
    }
}

macro_rules! verb {
    ($name:ident, $method:expr, $doc:literal) => {
        impl Router {
            #[doc = $doc]
            pub fn $name<H, Fut>(&self, pattern: &str, handler: H) -> &Self
            where
                H: Fn(RequestContext, ResponseWriter, Next) -> Fut + Send + Sync + 'static,
                Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
            {
                self.route($method, pattern, handler)
            }
        }
    };
}

verb!(get, Method::GET, "Register a handler for GET requests on `pattern`. Chainable.");
verb!(post, Method::POST, "Register a handler for POST requests on `pattern`. Chainable.");
verb!(put, Method::PUT, "Register a handler for PUT requests on `pattern`. Chainable.");
verb!(delete, Method::DELETE, "Register a handler for DELETE requests on `pattern`. Chainable.");
verb!(patch, Method::PATCH, "Register a handler for PATCH requests on `pattern`. Chainable.");
verb!(head, Method::HEAD, "Register a handler for HEAD requests on `pattern`. Chainable.");
verb!(options, Method::OPTIONS, "Register a handler for OPTIONS requests on `pattern`. Chainable.");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::Forwarder;
    use axum::http::HeaderMap;
    use bytes::Bytes;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn request_for(url: &str) -> Arc<InterceptedRequest> {
        Arc::new(InterceptedRequest::synthetic(
            Method::GET,
            Url::parse(url).unwrap(),
            HeaderMap::new(),
            Bytes::new(),
        ))
    }

    fn writer_for(
        request: &Arc<InterceptedRequest>,
    ) -> (
        ResponseWriter,
        oneshot::Receiver<axum::response::Response>,
    ) {
        let forwarder = Arc::new(Forwarder::new(Duration::from_millis(250)));
        ResponseWriter::new(request.clone(), forwarder, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn foreign_base_url_is_not_matched() {
        let router = Router::new("http://router-a.test").unwrap();
        router.get("/x", |_ctx, res, _next| async move {
            res.send("nope");
            Ok(())
        });

        let request = request_for("http://router-b.test/x");
        let (writer, _rx) = writer_for(&request);

        assert!(!router.attempt_match(request, writer.clone()).await);
        assert!(!writer.was_matched());
        assert!(!writer.is_resolved());
    }

    #[tokio::test]
    async fn handler_error_is_contained() {
        let router = Router::new("http://router-err.test").unwrap();
        router
            .get("/boom", |_ctx, _res, _next| async move {
                Err::<(), _>("boom".into())
            })
            .get("/boom", |_ctx, res, _next| async move {
                res.send("unreachable after an error");
                Ok(())
            });

        let request = request_for("http://router-err.test/boom");
        let (writer, _rx) = writer_for(&request);

        // The entry matched, the error stopped the chain, nothing resolved.
        assert!(router.attempt_match(request, writer.clone()).await);
        assert!(writer.was_matched());
        assert!(!writer.is_resolved());
    }

    #[tokio::test]
    async fn next_continues_within_the_same_router() {
        let router = Router::new("http://router-next.test").unwrap();
        router
            .use_(|_ctx, res, next| async move {
                res.header("x-seen", "1");
                next.proceed();
                Ok(())
            })
            .get("/page", |_ctx, res, _next| async move {
                res.send("terminal");
                Ok(())
            });

        let request = request_for("http://router-next.test/page");
        let (writer, rx) = writer_for(&request);

        assert!(router.attempt_match(request, writer).await);
        let response = rx.await.unwrap();
        assert_eq!(response.headers()["x-seen"], "1");
    }
}
