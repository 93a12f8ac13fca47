//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! interception engine. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the interception engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Listener configuration (bind address, connection limits).
    pub listener: ListenerConfig,

    /// Timeout configuration for resolution and forwarding.
    pub timeouts: TimeoutConfig,

    /// Control channel (handshake) settings.
    pub control: ControlConfig,

    /// Install/activate lifecycle settings.
    pub lifecycle: LifecycleConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8888").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8888".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Timeout configuration for request resolution.
///
/// Two timers race against the handler chain for every intercepted request:
/// the global fallback (no router answered) and the per-response safety net
/// (a handler started but never finished).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Delay before an unresolved request falls back to the real network,
    /// in milliseconds.
    pub fallback_delay_ms: u64,

    /// Per-response safety timeout in milliseconds. A response still
    /// pending after this long is forwarded to the real network with a
    /// warning.
    pub response_timeout_ms: u64,

    /// Connection establishment timeout for forwarded requests, in seconds.
    pub connect_secs: u64,

    /// Outer bound on total request handling time in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            fallback_delay_ms: 2000,
            response_timeout_ms: 10_000,
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Control channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Enable the handshake control loop.
    pub enabled: bool,

    /// Buffered capacity of the control event channel.
    pub channel_capacity: usize,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel_capacity: 64,
        }
    }
}

/// Install/activate lifecycle configuration.
///
/// Only meaningful when the hosting runtime drives the engine through
/// explicit lifecycle phases. When `managed` is false the activation hooks
/// never run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// The hosting runtime supports install/activate phases.
    pub managed: bool,

    /// Claim existing client sessions immediately on activation.
    pub claim_on_activate: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            managed: false,
            claim_on_activate: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
