//! Control plane: handshake protocol and client session tracking.
//!
//! # Data Flow
//! ```text
//! Controlling client
//!     → ControlChannel.post(frame, reply port)
//!     → handshake.rs (PING/PONG, REQUEST_CLAIM/ESTABLISHED)
//!     → clients.rs (claim sessions)
//!     → reply frame on the private port
//! ```

pub mod clients;
pub mod handshake;
pub mod port;

pub use clients::{ClientRegistry, ClientSession};
pub use handshake::{ControlChannel, ControlFrame, MessageEvent};
pub use port::{pair, ControlPort};
