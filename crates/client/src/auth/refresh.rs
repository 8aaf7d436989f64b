//! Single-flight session refresh.
//!
//! When a request discovers an expired session (401), the client must perform
//! exactly one `POST /auth/refresh` no matter how many requests make the same
//! discovery concurrently. The coordinator is a two-state machine (idle /
//! refreshing) guarded by a synchronous mutex: the check-and-set and the
//! waiter enqueue happen in one critical section with no await point, so two
//! refreshes can never race. The refresh itself runs on a spawned task; a
//! caller that goes away mid-refresh therefore never cancels the refresh for
//! the other waiters.

use std::mem;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use stockarc_domain::constants::AUTH_REFRESH_PATH;
use stockarc_domain::{unwrap_envelope, AccessTokenPayload, AppError, Result};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::auth::SessionStore;

/// Waiters attached to the in-flight refresh, drained when it settles.
struct RefreshState {
    refreshing: bool,
    waiters: Vec<oneshot::Sender<Result<()>>>,
}

/// Single-flight coordinator for the session refresh protocol.
pub struct RefreshCoordinator {
    http: reqwest::Client,
    refresh_url: String,
    session: Arc<dyn SessionStore>,
    timeout: Duration,
    state: Arc<Mutex<RefreshState>>,
}

impl RefreshCoordinator {
    /// Creates a coordinator around the shared cookie-jar client.
    ///
    /// The refresh request is sent with cookies and without an
    /// `Authorization` header, so `http` must be the client that owns the
    /// session cookie jar.
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        session: Arc<dyn SessionStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            refresh_url: format!("{base_url}{AUTH_REFRESH_PATH}"),
            session,
            timeout,
            state: Arc::new(Mutex::new(RefreshState { refreshing: false, waiters: Vec::new() })),
        }
    }

    /// Waits until a session refresh completes, starting one if none is in
    /// flight.
    ///
    /// Callers that arrive while a refresh is already running attach to that
    /// refresh and observe its outcome; they never start a second call.
    ///
    /// # Errors
    ///
    /// Every failed refresh — non-2xx status, transport failure, timeout,
    /// malformed body — surfaces as the same `UNAUTHORIZED`/401 error.
    pub async fn ensure_refreshed(&self) -> Result<()> {
        let rx = {
            // Check-and-set and enqueue under one lock, with no await point
            // in between, so concurrent discoveries cannot start a second
            // refresh.
            let mut state = self.state.lock();
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            if !state.refreshing {
                state.refreshing = true;
                self.spawn_refresh();
            }
            rx
        };

        debug!("waiting for session refresh");
        match rx.await {
            Ok(outcome) => outcome,
            // The driver task vanished without settling its waiters.
            Err(_) => Err(AppError::session_expired("Session refresh was interrupted")),
        }
    }

    fn spawn_refresh(&self) {
        let http = self.http.clone();
        let url = self.refresh_url.clone();
        let session = Arc::clone(&self.session);
        let state = Arc::clone(&self.state);
        let timeout = self.timeout;

        tokio::spawn(async move {
            let outcome = run_refresh(&http, &url, session.as_ref(), timeout).await;
            match &outcome {
                Ok(()) => info!("session refreshed"),
                Err(err) => warn!(error = %err, "session refresh failed"),
            }

            // Drain-and-reset runs after every driver outcome, so the
            // coordinator can never stay stuck in the refreshing state.
            let waiters = {
                let mut state = state.lock();
                state.refreshing = false;
                mem::take(&mut state.waiters)
            };
            for waiter in waiters {
                let _ = waiter.send(outcome.clone());
            }
        });
    }

    #[cfg(test)]
    fn snapshot(&self) -> (bool, usize) {
        let state = self.state.lock();
        (state.refreshing, state.waiters.len())
    }
}

/// One refresh call: cookies yes, `Authorization` no.
async fn run_refresh(
    http: &reqwest::Client,
    url: &str,
    session: &dyn SessionStore,
    timeout: Duration,
) -> Result<()> {
    let send = http.post(url).header("Content-Type", "application/json").send();
    let response = match tokio::time::timeout(timeout, send).await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            return Err(AppError::session_expired("Session refresh failed")
                .with_details(Value::String(err.to_string())))
        }
        Err(_) => {
            return Err(AppError::session_expired("Session refresh timed out")
                .with_details(Value::String(format!(
                    "no response within {}ms",
                    timeout.as_millis()
                ))))
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::session_expired(format!("Refresh endpoint returned status {status}"))
            .with_details(Value::String(body)));
    }

    let body: Value = response.json().await.map_err(|err| {
        AppError::session_expired("Refresh response was not valid JSON")
            .with_details(Value::String(err.to_string()))
    })?;
    let payload: AccessTokenPayload = serde_json::from_value(unwrap_envelope(body)).map_err(|err| {
        AppError::session_expired("Refresh response did not contain an access token")
            .with_details(Value::String(err.to_string()))
    })?;

    session.update_access_token(payload.access_token);
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use stockarc_domain::ErrorCode;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::AuthSession;

    fn coordinator_for(server_uri: &str, session: Arc<AuthSession>) -> RefreshCoordinator {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        RefreshCoordinator::new(http, server_uri, session, Duration::from_secs(5))
    }

    fn refresh_ok_body(token: &str) -> Value {
        json!({"isOk": true, "data": {"accessToken": token}})
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(refresh_ok_body("fresh-token"))
                    .set_delay(Duration::from_millis(150)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = Arc::new(AuthSession::new());
        let coordinator = Arc::new(coordinator_for(&server.uri(), Arc::clone(&session)));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let coordinator = Arc::clone(&coordinator);
            handles.push(tokio::spawn(async move { coordinator.ensure_refreshed().await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(session.access_token(), Some("fresh-token".to_string()));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(coordinator.snapshot(), (false, 0));
    }

    #[tokio::test]
    async fn refresh_failure_rejects_all_waiters_with_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(100)))
            .expect(1)
            .mount(&server)
            .await;

        let session = Arc::new(AuthSession::with_token("stale"));
        let coordinator = Arc::new(coordinator_for(&server.uri(), Arc::clone(&session)));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let coordinator = Arc::clone(&coordinator);
            handles.push(tokio::spawn(async move { coordinator.ensure_refreshed().await }));
        }
        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert_eq!(err.code, ErrorCode::Unauthorized);
            assert_eq!(err.status, Some(401));
        }

        // The failed refresh never touched the stored token.
        assert_eq!(session.access_token(), Some("stale".to_string()));
        assert_eq!(coordinator.snapshot(), (false, 0));
    }

    #[tokio::test]
    async fn resets_to_idle_after_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(refresh_ok_body("second-wind")))
            .mount(&server)
            .await;

        let session = Arc::new(AuthSession::new());
        let coordinator = coordinator_for(&server.uri(), Arc::clone(&session));

        assert!(coordinator.ensure_refreshed().await.is_err());
        coordinator.ensure_refreshed().await.unwrap();

        assert_eq!(session.access_token(), Some("second-wind".to_string()));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
    }

    #[tokio::test]
    async fn refresh_sends_no_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(|req: &wiremock::Request| !req.headers.contains_key("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(refresh_ok_body("tok")))
            .expect(1)
            .mount(&server)
            .await;

        let session = Arc::new(AuthSession::with_token("stale"));
        let coordinator = coordinator_for(&server.uri(), Arc::clone(&session));
        coordinator.ensure_refreshed().await.unwrap();

        assert_eq!(session.access_token(), Some("tok".to_string()));
    }

    #[tokio::test]
    async fn bad_refresh_body_maps_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"isOk": true, "data": {}})))
            .mount(&server)
            .await;

        let session = Arc::new(AuthSession::new());
        let coordinator = coordinator_for(&server.uri(), Arc::clone(&session));

        let err = coordinator.ensure_refreshed().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert_eq!(err.status, Some(401));
        assert!(!session.is_authenticated());
    }
}
