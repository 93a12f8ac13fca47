//! Activation hooks for managed runtimes.
//!
//! # Responsibilities
//! - Skip any waiting phase when the hosting runtime has install/activate
//!   lifecycle semantics
//! - Claim existing client sessions on activation
//!
//! # Design Decisions
//! - Guarded: does nothing unless the config declares a managed lifecycle
//! - Applies to the engine's own lifecycle, not the per-request handshake
//!   (which claims on demand via REQUEST_CLAIM)

use std::sync::Arc;

use crate::config::LifecycleConfig;
use crate::control::clients::ClientRegistry;

/// Run the activation sequence, if the runtime has one.
pub async fn activate(config: &LifecycleConfig, clients: &Arc<ClientRegistry>) {
    if !config.managed {
        return;
    }

    tracing::info!("Activating: skipping waiting phase");

    if config.claim_on_activate {
        let claimed = clients.claim_all().await;
        tracing::info!(claimed, "Activation claimed existing client sessions");
    }
}
