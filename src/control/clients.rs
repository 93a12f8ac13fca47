//! Client session tracking.
//!
//! # Responsibilities
//! - Track the client scopes connected to this engine instance
//! - Mark sessions as controlled when the engine claims them
//! - Let embedders observe the claim transition
//!
//! # Design Decisions
//! - Sessions are identified by generated IDs, not peer addresses; one
//!   scope can hold several sessions
//! - The controlled flag is a watch channel so a session owner can await
//!   being claimed instead of polling

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use uuid::Uuid;

/// One connected client scope.
pub struct ClientSession {
    id: String,
    scope: String,
    controlled: watch::Sender<bool>,
}

impl ClientSession {
    fn new(scope: String) -> Self {
        let (controlled, _) = watch::channel(false);
        Self {
            id: Uuid::new_v4().to_string(),
            scope,
            controlled,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Whether this engine instance controls the session.
    pub fn is_controlled(&self) -> bool {
        *self.controlled.borrow()
    }

    /// Observe the controlled flag; resolves on claim.
    pub fn watch_controlled(&self) -> watch::Receiver<bool> {
        self.controlled.subscribe()
    }

    fn claim(&self) {
        self.controlled.send_replace(true);
    }
}

/// Registry of the client sessions in this engine's scope.
#[derive(Default)]
pub struct ClientRegistry {
    sessions: DashMap<String, Arc<ClientSession>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for a client scope.
    pub fn connect(&self, scope: impl Into<String>) -> Arc<ClientSession> {
        let session = Arc::new(ClientSession::new(scope.into()));
        self.sessions.insert(session.id.clone(), session.clone());

        tracing::debug!(
            session_id = %session.id,
            scope = %session.scope,
            "Client session connected"
        );
        session
    }

    /// Remove a session.
    pub fn disconnect(&self, id: &str) {
        if self.sessions.remove(id).is_some() {
            tracing::debug!(session_id = %id, "Client session disconnected");
        }
    }

    /// Claim every eligible session for this engine instance.
    ///
    /// Returns the number of sessions claimed in this pass (already
    /// controlled sessions are not counted).
    pub async fn claim_all(&self) -> usize {
        let mut claimed = 0;
        for entry in self.sessions.iter() {
            let session = entry.value();
            if !session.is_controlled() {
                session.claim();
                claimed += 1;
            }
        }

        tracing::info!(claimed, total = self.sessions.len(), "Claimed client sessions");
        claimed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Number of sessions currently controlled.
    pub fn controlled_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|entry| entry.value().is_controlled())
            .count()
    }
}
