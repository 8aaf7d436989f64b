//! # StockArc Domain
//!
//! Shared domain types for the StockArc API client.
//!
//! This crate contains:
//! - The normalized error taxonomy (`AppError`, `ErrorCode`)
//! - Backend wire types (response envelope, error bodies, token payloads)
//! - Endpoint, header and cookie constants
//!
//! ## Architecture
//! - No dependencies on other StockArc crates
//! - Only external dependencies allowed
//! - Pure data types, no I/O

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::{AppError, ErrorCode, Result};
pub use types::{unwrap_envelope, AccessTokenPayload, CsrfTokenPayload, Envelope, ErrorBody};
