//! Resilient HTTP client for the StockArc backend.
//!
//! Every StockArc surface talks to a cookie-session backend protected by
//! short-lived bearer tokens and CSRF tokens. This crate owns the one hard
//! part of that conversation: keeping many in-flight requests correct when
//! the session expires or the CSRF token rotates mid-flight.
//!
//! Guarantees:
//! - An expired-session 401 triggers exactly one refresh call no matter how
//!   many concurrent requests observe it; all of them retry transparently
//!   once the refresh settles.
//! - A CSRF rejection is retried once, without the stale token.
//! - Every failure surfaces as one normalized [`AppError`], never a raw
//!   transport or serialization error.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐
//! │   ApiClient   │  facade: verb helpers, wiring, health check
//! └───────┬───────┘
//!         │
//!         ├──► RequestPipeline     (bounded refresh/CSRF retry orchestration)
//!         │         │
//!         │         ├──► RequestExecutor    (one physical HTTP attempt)
//!         │         ├──► RefreshCoordinator (single-flight session refresh)
//!         │         └──► CsrfTokenProvider  (cookie fast path + fetch)
//!         │
//!         └──► AuthSession         (in-memory bearer token, injectable)
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod auth;
pub mod client;
pub mod config;
pub mod csrf;
pub mod http;
pub mod normalize;
pub mod pipeline;

// Re-export commonly used items
pub use auth::{AuthSession, RefreshCoordinator, SessionStore};
pub use client::{ApiClient, ApiClientBuilder};
pub use config::ClientConfig;
pub use csrf::CsrfTokenProvider;
pub use http::{RawResponse, RequestConfig, RequestExecutor};
pub use pipeline::RequestPipeline;
pub use stockarc_domain::{AppError, ErrorCode, Result};
