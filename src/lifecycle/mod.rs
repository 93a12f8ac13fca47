//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Managed runtime → skip waiting → claim existing sessions
//!
//! Shutdown (shutdown.rs):
//!     Trigger → dispatcher drains → control loop exits
//!
//! Signals (signals.rs):
//!     Ctrl+C → graceful shutdown trigger
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
