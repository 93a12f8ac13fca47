//! Passthrough forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! InterceptedRequest (+ optional overrides)
//!     → client.rs (strip hop-by-hop, rebuild, dial origin directly)
//!     → real network response
//!     → resolves the pending ResponseWriter
//! ```
//!
//! # Design Decisions
//! - One shared client per engine instance (connection pooling)
//! - Forwarding bypasses the interception listener by construction

pub mod client;

pub use client::{ForwardError, ForwardOverrides, Forwarder};
