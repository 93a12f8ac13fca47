//! HTTP server setup and the interception entry point.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all interception handler
//! - Wire up middleware (tracing, timeout, request ID, concurrency limit)
//! - Hand every intercepted request to the registered routers
//! - Arm the global fallback timer (unclaimed requests → real network)
//! - Run the handshake control loop and lifecycle activation
//!
//! # Design Decisions
//! - The deferred completion signal is created before any router work is
//!   spawned, so a pending result always exists for the platform
//! - Router attempts run as independent tasks in registration order; the
//!   first terminal resolution wins through the idempotent guard
//! - The fallback stands down once any entry matches syntactically; the
//!   per-response safety timer covers matched-but-silent handlers

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    request_id::{MakeRequestUuid, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{EngineConfig, TimeoutConfig};
use crate::control::clients::ClientRegistry;
use crate::control::handshake::{self, ControlChannel, MessageEvent};
use crate::forward::Forwarder;
use crate::http::request::InterceptedRequest;
use crate::http::response::{ResponseWriter, X_POWERED_BY};
use crate::lifecycle::{signals, startup, Shutdown};
use crate::observability::metrics;
use crate::routing::registry;

/// Application state injected into the interception handler.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub timeouts: TimeoutConfig,
}

/// HTTP server hosting the interception engine.
pub struct HttpServer {
    router: Router,
    config: EngineConfig,
    clients: Arc<ClientRegistry>,
    control: ControlChannel,
    control_events: Option<mpsc::Receiver<MessageEvent>>,
    shutdown: Arc<Shutdown>,
}

impl HttpServer {
    /// Create a new server with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        let forwarder = Arc::new(Forwarder::new(Duration::from_secs(
            config.timeouts.connect_secs,
        )));
        let clients = Arc::new(ClientRegistry::new());
        let shutdown = Arc::new(Shutdown::new());

        let (control_tx, control_rx) = mpsc::channel(config.control.channel_capacity);

        let state = AppState {
            forwarder,
            timeouts: config.timeouts.clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            clients,
            control: ControlChannel::new(control_tx),
            control_events: Some(control_rx),
            shutdown,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &EngineConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(intercept_handler))
            .route("/", any(intercept_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(ConcurrencyLimitLayer::new(config.listener.max_connections))
    }

    /// Sending half of the handshake control channel.
    pub fn control(&self) -> ControlChannel {
        self.control.clone()
    }

    /// The client session registry for this engine instance.
    pub fn clients(&self) -> Arc<ClientRegistry> {
        self.clients.clone()
    }

    /// The shutdown coordinator.
    pub fn shutdown_handle(&self) -> Arc<Shutdown> {
        self.shutdown.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(mut self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routers = registry::len(),
            "Interception engine starting"
        );

        startup::activate(&self.config.lifecycle, &self.clients).await;

        if self.config.control.enabled {
            if let Some(events) = self.control_events.take() {
                tokio::spawn(handshake::run(
                    events,
                    self.clients.clone(),
                    self.shutdown.subscribe(),
                ));
            }
        }

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(signals::shutdown_signal(self.shutdown.clone()))
            .await?;

        tracing::info!("Interception engine stopped");
        Ok(())
    }
}

/// The interception entry point: one invocation per intercepted request.
async fn intercept_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();

    let intercepted = match InterceptedRequest::capture(request).await {
        Ok(captured) => Arc::new(captured),
        Err(error) => {
            tracing::warn!(client = %addr, error = %error, "Dropping uncapturable request");
            metrics::record_request("unknown", 400, "error", start);
            return (StatusCode::BAD_REQUEST, error.to_string()).into_response();
        }
    };

    tracing::debug!(
        request_id = %intercepted.id(),
        method = %intercepted.method(),
        url = %intercepted.url(),
        client = %addr,
        "Intercepted request"
    );

    // The pending result must exist before any router work is spawned.
    let (writer, resolution) = ResponseWriter::new(
        intercepted.clone(),
        state.forwarder.clone(),
        Duration::from_millis(state.timeouts.response_timeout_ms),
    );

    // Every registered router gets a chance, in registration order. The
    // attempts are not serialized on completion; they race to resolve.
    for router in registry::routers() {
        let request = intercepted.clone();
        let writer = writer.clone();
        tokio::spawn(async move {
            router.attempt_match(request, writer).await;
        });
    }

    // Global fallback: an unclaimed request goes to the real network.
    {
        let writer = writer.clone();
        let delay = Duration::from_millis(state.timeouts.fallback_delay_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !writer.is_resolved() && !writer.was_matched() {
                tracing::debug!(
                    request_id = %writer.request().id(),
                    url = %writer.request().url(),
                    "No route matched, falling back to the real network"
                );
                writer.forward().await;
            }
        });
    }

    let method = intercepted.method().to_string();
    match resolution.await {
        Ok(response) => {
            let outcome = if response.headers().contains_key(X_POWERED_BY) {
                "mocked"
            } else {
                "passthrough"
            };
            metrics::record_request(&method, response.status().as_u16(), outcome, start);
            response
        }
        Err(_) => {
            // Unreachable while the safety timer holds a writer clone, but
            // fail closed rather than hang the connection.
            tracing::error!(
                request_id = %intercepted.id(),
                "Completion signal dropped without resolution"
            );
            metrics::record_request(&method, 502, "error", start);
            (StatusCode::BAD_GATEWAY, "Interception failed").into_response()
        }
    }
}
