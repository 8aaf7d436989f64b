//! Request construction and single-attempt dispatch.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use stockarc_domain::constants::{CSRF_HEADER, DEFAULT_TIMEOUT_MS};
use stockarc_domain::{unwrap_envelope, ErrorBody, Result};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::auth::SessionStore;
use crate::csrf::CsrfTokenProvider;
use crate::normalize;

/// Everything needed to issue, and re-issue, one logical request.
///
/// The pipeline keeps the config across attempts so a retry after a session
/// refresh is byte-identical, and derives the CSRF retry via
/// [`RequestConfig::without_csrf`].
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub cancel: Option<CancellationToken>,
    pub skip_auth: bool,
    pub skip_csrf: bool,
}

impl RequestConfig {
    /// Creates a request for `path` with the default timeout and no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            cancel: None,
            skip_auth: false,
            skip_csrf: false,
        }
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds an extra header to the request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Overrides the per-attempt timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ties the request to a caller-held cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Sends the request without a bearer token and opts it out of the
    /// refresh-on-401 path.
    #[must_use]
    pub fn without_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    /// Sends the request without a CSRF token.
    #[must_use]
    pub fn without_csrf(mut self) -> Self {
        self.skip_csrf = true;
        self
    }

    /// Whether this request mutates state and therefore carries a CSRF token.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        self.method == Method::POST
            || self.method == Method::PUT
            || self.method == Method::PATCH
            || self.method == Method::DELETE
    }
}

/// Outcome of one physical attempt that produced an HTTP response.
///
/// Transport failures (connect errors, timeouts, cancellation) never reach
/// this type; the executor normalizes them into [`crate::AppError`] directly.
#[derive(Debug)]
pub enum RawResponse {
    /// 2xx: the envelope-unwrapped JSON body, `Null` for 204/205.
    Success(Value),
    /// Non-2xx: status plus the leniently parsed error body.
    Failure { status: StatusCode, body: ErrorBody },
}

/// Issues exactly one HTTP attempt per call.
///
/// Retry and refresh decisions belong to [`crate::RequestPipeline`]; the
/// executor only assembles headers, dispatches, and reads the response.
pub struct RequestExecutor {
    http: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
    csrf: Arc<CsrfTokenProvider>,
}

impl RequestExecutor {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        session: Arc<dyn SessionStore>,
        csrf: Arc<CsrfTokenProvider>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            session,
            csrf,
        }
    }

    /// Sends one attempt described by `config`.
    ///
    /// The attempt owns exactly one deadline signal: a caller-supplied
    /// cancellation token replaces the constructed timeout entirely, so a
    /// caller that never cancels waits as long as it likes. Without one, the
    /// whole attempt runs under `config.timeout`.
    ///
    /// # Errors
    ///
    /// Returns a normalized error for transport failures, attempt timeouts,
    /// cancellation, CSRF sourcing failures, and undecodable success bodies.
    pub async fn send(&self, config: &RequestConfig) -> Result<RawResponse> {
        match &config.cancel {
            Some(token) => tokio::select! {
                () = token.cancelled() => Err(normalize::cancelled()),
                outcome = self.attempt(config) => outcome,
            },
            None => match tokio::time::timeout(config.timeout, self.attempt(config)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(normalize::attempt_timeout(config.timeout)),
            },
        }
    }

    /// Header assembly:
    /// - `Content-Type: application/json` always,
    /// - `Authorization: Bearer …` when auth is enabled and a token is held,
    /// - the CSRF header on mutating requests unless skipped,
    /// - any extra headers from the config, last.
    async fn attempt(&self, config: &RequestConfig) -> Result<RawResponse> {
        let url = format!("{}{}", self.base_url, config.path);
        let mut request = self
            .http
            .request(config.method.clone(), &url)
            .header("Content-Type", "application/json");

        if !config.skip_auth {
            if let Some(token) = self.session.access_token() {
                request = request.bearer_auth(token);
            }
        }

        // CSRF sourcing can itself fail; that surfaces before anything is
        // sent so the attempt is never half-issued. It runs inside the
        // attempt's deadline, so a fetch-fallback cannot outlive it.
        if config.is_mutating() && !config.skip_csrf {
            let token = self.csrf.token().await?;
            request = request.header(CSRF_HEADER, token);
        }

        for (name, value) in &config.headers {
            request = request.header(name, value);
        }

        if let Some(body) = &config.body {
            request = request.json(body);
        }

        debug!(method = %config.method, url = %url, "sending request");

        let response = request.send().await.map_err(normalize::transport)?;
        self.read(response).await
    }

    async fn read(&self, response: reqwest::Response) -> Result<RawResponse> {
        let status = response.status();

        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            return Ok(RawResponse::Success(Value::Null));
        }

        if status.is_success() {
            let body: Value = response.json().await.map_err(normalize::transport)?;
            return Ok(RawResponse::Success(unwrap_envelope(body)));
        }

        let text = response.text().await.unwrap_or_default();
        Ok(RawResponse::Failure {
            status,
            body: ErrorBody::from_text(&text),
        })
    }
}
