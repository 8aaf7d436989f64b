//! Session authentication for the StockArc client
//!
//! This module owns the bearer access token and the single-flight session
//! refresh protocol around it.
//!
//! # Architecture
//!
//! - `SessionStore` is the seam between the request layer and whatever holds
//!   the token; `AuthSession` is the in-memory implementation the facade
//!   wires in by default.
//! - `RefreshCoordinator` guarantees at most one refresh call is in flight
//!   per client instance, with every concurrent discoverer of an expired
//!   session attached to that one call's outcome.

pub mod refresh;
pub mod session;

pub use refresh::RefreshCoordinator;
pub use session::{AuthSession, SessionStore};
