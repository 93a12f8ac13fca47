//! Process-wide router registry.
//!
//! # Responsibilities
//! - Track every constructed router in registration order
//! - Hand the dispatcher a consistent snapshot per request
//!
//! # Design Decisions
//! - Single well-known access point, not ad-hoc globals
//! - Append-only in production paths; routers are never mutated in place
//! - The registry holds strong references; routers live as long as the
//!   interception layer is active

use std::sync::{Arc, OnceLock, RwLock};

use crate::routing::router::Router;

static REGISTRY: OnceLock<RwLock<Vec<Arc<Router>>>> = OnceLock::new();

fn registry() -> &'static RwLock<Vec<Arc<Router>>> {
    REGISTRY.get_or_init(|| RwLock::new(Vec::new()))
}

/// Append a router. Called from `Router` construction.
pub(crate) fn register(router: Arc<Router>) {
    registry()
        .write()
        .expect("router registry lock poisoned")
        .push(router);
}

/// Snapshot of all registered routers, in registration order.
pub fn routers() -> Vec<Arc<Router>> {
    registry()
        .read()
        .expect("router registry lock poisoned")
        .clone()
}

/// Number of registered routers.
pub fn len() -> usize {
    registry()
        .read()
        .expect("router registry lock poisoned")
        .len()
}
