//! CSRF token sourcing for state-mutating requests.
//!
//! The backend sets a CSRF cookie alongside the session; reading it from the
//! shared cookie jar is the fast path. When no cookie is visible the provider
//! falls back to an explicit fetch and caches the result until the pipeline
//! invalidates it after a CSRF rejection.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use serde_json::Value;
use stockarc_domain::constants::{CSRF_COOKIE_PREFIX, CSRF_TOKEN_PATH};
use stockarc_domain::{unwrap_envelope, AppError, CsrfTokenPayload, ErrorBody, Result};
use tracing::debug;

use crate::normalize;

/// Supplies CSRF tokens for state-mutating requests.
pub struct CsrfTokenProvider {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base_url: Url,
    fetch_url: String,
    timeout: Duration,
    cached: RwLock<Option<String>>,
}

impl CsrfTokenProvider {
    /// Creates a provider reading the given jar and fetching from the given
    /// base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` does not parse as a URL.
    pub fn new(
        http: reqwest::Client,
        jar: Arc<Jar>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| AppError::unknown(format!("Invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            http,
            jar,
            base_url: parsed,
            fetch_url: format!("{base_url}{CSRF_TOKEN_PATH}"),
            timeout,
            cached: RwLock::new(None),
        })
    }

    /// Returns a CSRF token for the next state-mutating request.
    ///
    /// Order: the backend cookie, then the cached fetched value, then an
    /// explicit fetch whose result is cached.
    ///
    /// # Errors
    ///
    /// Returns a normalized error when no cookie is available and the
    /// explicit fetch fails.
    pub async fn token(&self) -> Result<String> {
        if let Some(token) = self.cookie_token() {
            return Ok(token);
        }
        if let Some(token) = self.cached.read().clone() {
            return Ok(token);
        }

        let token = self.fetch_token().await?;
        *self.cached.write() = Some(token.clone());
        Ok(token)
    }

    /// Drops the cached fetched token so the next request re-sources one.
    ///
    /// The pipeline calls this when the backend rejects a token; a rotated
    /// cookie, when present, takes precedence on the next read anyway.
    pub fn invalidate(&self) {
        self.cached.write().take();
        debug!("cached CSRF token invalidated");
    }

    fn cookie_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let cookies = header.to_str().ok()?;
        cookies.split(';').map(str::trim).find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name.starts_with(CSRF_COOKIE_PREFIX) && !value.is_empty()).then(|| value.to_string())
        })
    }

    async fn fetch_token(&self) -> Result<String> {
        debug!(url = %self.fetch_url, "fetching CSRF token");

        let send = self.http.get(&self.fetch_url).send();
        let response = match tokio::time::timeout(self.timeout, send).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(normalize::transport(err)),
            Err(_) => return Err(normalize::attempt_timeout(self.timeout)),
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(normalize::http_failure(status, &ErrorBody::from_text(&text)));
        }

        let body: Value = response.json().await.map_err(normalize::transport)?;
        let payload: CsrfTokenPayload =
            serde_json::from_value(unwrap_envelope(body)).map_err(|err| normalize::decode(&err))?;
        Ok(payload.csrf_token)
    }
}
