//! Single-attempt HTTP execution.
//!
//! [`RequestExecutor`] builds and sends exactly one physical HTTP request and
//! reads the response into a [`RawResponse`]. Retry decisions live one layer
//! up in the pipeline; nothing in this module loops.

pub mod executor;

pub use executor::{RawResponse, RequestConfig, RequestExecutor};
