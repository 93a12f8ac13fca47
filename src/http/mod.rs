//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Intercepted connection
//!     → server.rs (Axum setup, interception entry point)
//!     → request.rs (buffer body, reconstruct target URL, request ID)
//!     → [routing layer attempts a match]
//!     → response.rs (accumulate, finalize, resolve exactly once)
//!     → Send to client
//! ```

pub mod mime;
pub mod request;
pub mod response;
pub mod server;

pub use request::{InterceptedRequest, X_REQUEST_ID};
pub use response::{ResponseError, ResponseWriter, SendBody};
pub use server::HttpServer;
