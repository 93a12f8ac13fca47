//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Intercepted Request (method, URL, headers, body)
//!     → registry.rs (snapshot of routers, registration order)
//!     → router.rs (entry iteration, handler invocation, next())
//!     → matcher.rs (base URL strip, pattern match, param binding)
//!     → Side effects on the shared ResponseWriter; first resolution wins
//! ```
//!
//! # Design Decisions
//! - Every registered router gets a chance at every request
//! - Within one router, entries match in registration order
//! - A router cannot veto other routers; only a terminal resolution
//!   (end/forward/json/send) settles the request

pub mod matcher;
pub mod registry;
pub mod router;

pub use matcher::{PathParams, PathPattern};
pub use router::{BoxError, Next, RequestContext, Router, RouterError};
