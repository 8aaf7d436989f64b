//! Orchestration of one logical request across bounded physical attempts.
//!
//! The pipeline owns the retry policy: at most one session-refresh retry and
//! at most one CSRF retry per logical call. Both bounds are structural flags
//! checked here, never emergent from backend behavior, so a misbehaving
//! server can never drive the loop unbounded. Worst case is three physical
//! attempts: initial, post-refresh, post-CSRF-rotation.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use stockarc_domain::constants::NO_REFRESH_PATHS;
use stockarc_domain::Result;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::auth::RefreshCoordinator;
use crate::csrf::CsrfTokenProvider;
use crate::http::{RawResponse, RequestConfig, RequestExecutor};
use crate::normalize;

/// The only entry point domain code calls.
///
/// Callers hand over a [`RequestConfig`] and receive either the decoded
/// payload or a normalized [`crate::AppError`]; envelopes, refreshes, and
/// CSRF rotation are invisible at this boundary.
pub struct RequestPipeline {
    executor: Arc<RequestExecutor>,
    coordinator: Arc<RefreshCoordinator>,
    csrf: Arc<CsrfTokenProvider>,
}

impl RequestPipeline {
    pub fn new(
        executor: Arc<RequestExecutor>,
        coordinator: Arc<RefreshCoordinator>,
        csrf: Arc<CsrfTokenProvider>,
    ) -> Self {
        Self {
            executor,
            coordinator,
            csrf,
        }
    }

    /// Executes one logical request and decodes the payload into `T`.
    ///
    /// Unit responses (204/205, or an enveloped `null`) decode into `()`.
    ///
    /// # Errors
    ///
    /// Returns the normalized error for any unrecovered failure, including a
    /// payload that does not decode into `T`.
    pub async fn execute<T: DeserializeOwned>(&self, config: RequestConfig) -> Result<T> {
        let value = self.execute_value(config).await?;
        serde_json::from_value(value).map_err(|err| normalize::decode(&err))
    }

    /// Executes one logical request and returns the raw unwrapped payload.
    ///
    /// # Errors
    ///
    /// Returns the normalized error for any unrecovered failure.
    #[instrument(
        name = "request",
        skip(self, config),
        fields(
            method = %config.method,
            path = %config.path,
            request_id = %Uuid::new_v4(),
        )
    )]
    pub async fn execute_value(&self, config: RequestConfig) -> Result<Value> {
        let mut attempt = config;
        let mut refreshed = false;
        let mut csrf_retried = false;

        loop {
            let raw = self.executor.send(&attempt).await?;
            let (status, body) = match raw {
                RawResponse::Success(value) => return Ok(value),
                RawResponse::Failure { status, body } => (status, body),
            };

            if status == StatusCode::UNAUTHORIZED
                && !attempt.skip_auth
                && !refreshed
                && !is_no_refresh_path(&attempt.path)
            {
                refreshed = true;
                debug!("session expired, coordinating refresh");
                self.await_refresh(&attempt).await?;
                debug!("session refreshed, retrying request");
                continue;
            }

            if status == StatusCode::FORBIDDEN
                && attempt.is_mutating()
                && !attempt.skip_csrf
                && !csrf_retried
                && body.is_csrf_rejection()
            {
                csrf_retried = true;
                warn!("CSRF token rejected, retrying once without the stale token");
                // The backend rotates the cookie on rejection; drop the
                // cached value and resend without a token.
                self.csrf.invalidate();
                attempt = attempt.without_csrf();
                continue;
            }

            return Err(normalize::http_failure(status, &body));
        }
    }

    /// Attaches to the single-flight refresh, honoring the caller's
    /// cancellation token.
    ///
    /// Cancelling here abandons only this caller's wait; the refresh itself
    /// keeps running for every other waiter attached to it.
    async fn await_refresh(&self, config: &RequestConfig) -> Result<()> {
        match &config.cancel {
            Some(token) => tokio::select! {
                () = token.cancelled() => Err(normalize::cancelled()),
                outcome = self.coordinator.ensure_refreshed() => outcome,
            },
            None => self.coordinator.ensure_refreshed().await,
        }
    }
}

/// Auth-mutation endpoints never enter the refresh-on-401 branch: a 401 from
/// login is a genuine credential failure, and a 401 from refresh must not
/// recurse into another refresh.
fn is_no_refresh_path(path: &str) -> bool {
    let bare = path.split_once('?').map_or(path, |(prefix, _)| prefix);
    NO_REFRESH_PATHS.contains(&bare)
}
