//! OS signal handling.
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Ctrl+C maps to a graceful shutdown trigger

use std::sync::Arc;

use crate::lifecycle::shutdown::Shutdown;

/// Resolve when shutdown should begin: Ctrl+C or an explicit trigger.
pub async fn shutdown_signal(shutdown: Arc<Shutdown>) {
    let mut rx = shutdown.subscribe();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(error) = result {
                tracing::error!(error = %error, "Failed to install Ctrl+C handler");
            }
            tracing::info!("Shutdown signal received");
            shutdown.trigger();
        }
        _ = rx.recv() => {
            tracing::info!("Shutdown triggered");
        }
    }
}
