//! Handshake protocol between a controlling client and the engine.
//!
//! # Protocol
//! ```text
//! PING          → PONG                      liveness, no side effects
//! REQUEST_CLAIM → (claim sessions) → ESTABLISHED
//! anything else → silence
//! ```
//!
//! # Design Decisions
//! - Replies travel on the private port attached to the event; events
//!   without a port are ignored entirely
//! - ESTABLISHED is only sent after the claim has completed
//! - The protocol is stateless; no sequence numbers, nothing persisted

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::control::clients::ClientRegistry;
use crate::control::port::ControlPort;
use crate::observability::metrics;

/// A handshake frame. Serialized as `{"action": "PING", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlFrame {
    Ping,
    Pong,
    RequestClaim,
    Established {
        /// Sessions claimed while handling the request.
        claimed: usize,
    },
    /// Any action this engine does not understand.
    #[serde(other)]
    Unknown,
}

/// A message event delivered to the control loop.
///
/// The port is the private reply channel; an event without one cannot be
/// answered and is dropped.
pub struct MessageEvent {
    pub frame: ControlFrame,
    pub port: Option<ControlPort<ControlFrame>>,
}

/// Sending half of the control channel, handed to embedders.
#[derive(Clone)]
pub struct ControlChannel {
    tx: mpsc::Sender<MessageEvent>,
}

impl ControlChannel {
    pub(crate) fn new(tx: mpsc::Sender<MessageEvent>) -> Self {
        Self { tx }
    }

    /// Post a message event to the engine's control loop.
    pub async fn post(
        &self,
        frame: ControlFrame,
        port: Option<ControlPort<ControlFrame>>,
    ) -> Result<(), ControlClosed> {
        self.tx
            .send(MessageEvent { frame, port })
            .await
            .map_err(|_| ControlClosed)
    }
}

/// The control loop has shut down.
#[derive(Debug, thiserror::Error)]
#[error("control channel closed")]
pub struct ControlClosed;

/// Run the handshake loop until the event source closes or shutdown fires.
pub async fn run(
    mut events: mpsc::Receiver<MessageEvent>,
    clients: Arc<ClientRegistry>,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::debug!("Handshake loop started");

    loop {
        let event = tokio::select! {
            _ = shutdown.recv() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        let Some(port) = event.port else {
            tracing::debug!("Control frame without a reply port ignored");
            continue;
        };

        match event.frame {
            ControlFrame::Ping => {
                metrics::record_handshake("ping");
                if port.send(ControlFrame::Pong).await.is_err() {
                    tracing::debug!("Handshake peer went away before PONG");
                }
            }
            ControlFrame::RequestClaim => {
                metrics::record_handshake("request_claim");
                let claimed = clients.claim_all().await;
                if port
                    .send(ControlFrame::Established { claimed })
                    .await
                    .is_err()
                {
                    tracing::debug!("Handshake peer went away before ESTABLISHED");
                }
            }
            // PONG/ESTABLISHED are replies, not requests; Unknown covers
            // foreign actions. All of them: no response, no error.
            ControlFrame::Pong | ControlFrame::Established { .. } | ControlFrame::Unknown => {}
        }
    }

    tracing::debug!("Handshake loop stopped");
}
