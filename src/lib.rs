//! Request interception and dispatch engine.
//!
//! Intercepts outgoing HTTP requests (clients point their proxy settings
//! at the listener), resolves them against user-registered [`Router`]s,
//! and falls back to the real network when no handler answers in time.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌────────────────────────────────────────────────┐
//!                        │              INTERCEPTION ENGINE               │
//!                        │                                                │
//!   Outgoing Request     │  ┌─────────┐   ┌──────────┐   ┌────────────┐  │
//!   ─────────────────────┼─▶│  http   │──▶│ routing  │──▶│  handlers  │  │
//!                        │  │ server  │   │ registry │   │ (mutate a  │  │
//!                        │  └────┬────┘   └──────────┘   │  Response  │  │
//!                        │       │                       │  Writer)   │  │
//!                        │       │ fallback / safety     └─────┬──────┘  │
//!                        │       ▼ timers                      │         │
//!   Response             │  ┌─────────┐                first resolve     │
//!   ◀────────────────────┼──│ forward │◀────────────────  wins ──────────┤
//!                        │  │ client  │   (real network)                 │
//!                        │  └─────────┘                                  │
//!                        │                                                │
//!                        │  control: handshake (PING/PONG, claim)        │
//!                        │  lifecycle: activation, shutdown               │
//!                        │  observability: tracing, metrics               │
//!                        └────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod forward;
pub mod http;
pub mod routing;

// Control plane
pub mod control;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::EngineConfig;
pub use http::response::{ResponseWriter, SendBody};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Next, RequestContext, Router};
