//! Two-endpoint message ports.
//!
//! A port pair is the private reply channel of the handshake protocol: one
//! endpoint travels with a message event, the other stays with the sender.
//! Either side can both send and receive.

use tokio::sync::mpsc;

/// One endpoint of a two-way message port.
///
/// Created in linked pairs by [`pair`]; a frame sent on one endpoint is
/// received on the other.
pub struct ControlPort<T> {
    tx: mpsc::Sender<T>,
    rx: tokio::sync::Mutex<mpsc::Receiver<T>>,
}

/// Create a linked pair of ports with the given buffer capacity.
pub fn pair<T>(capacity: usize) -> (ControlPort<T>, ControlPort<T>) {
    let (a_tx, a_rx) = mpsc::channel(capacity);
    let (b_tx, b_rx) = mpsc::channel(capacity);

    (
        ControlPort {
            tx: a_tx,
            rx: tokio::sync::Mutex::new(b_rx),
        },
        ControlPort {
            tx: b_tx,
            rx: tokio::sync::Mutex::new(a_rx),
        },
    )
}

impl<T> ControlPort<T> {
    /// Send a frame to the peer endpoint.
    ///
    /// Returns the frame back if the peer is gone.
    pub async fn send(&self, frame: T) -> Result<(), T> {
        self.tx.send(frame).await.map_err(|e| e.0)
    }

    /// Receive the next frame from the peer endpoint.
    ///
    /// Returns `None` once the peer endpoint has been dropped and the
    /// buffer is drained.
    pub async fn recv(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }

    /// Receive with a deadline. `None` on timeout or closed peer.
    pub async fn recv_timeout(&self, timeout: std::time::Duration) -> Option<T> {
        tokio::time::timeout(timeout, self.recv()).await.ok().flatten()
    }
}
