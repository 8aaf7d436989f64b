//! High-level StockArc API client.
//!
//! [`ApiClient`] wires the session store, CSRF provider, executor, refresh
//! coordinator, and pipeline behind plain verb helpers so domain code never
//! touches the plumbing. Construction is the only place the reqwest client
//! and the shared cookie jar are created; every component reuses them.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use stockarc_domain::constants::{HEALTH_CHECK_TIMEOUT_MS, HEALTH_PATH};
use stockarc_domain::{AppError, Result};
use tracing::debug;

use crate::auth::{AuthSession, RefreshCoordinator, SessionStore};
use crate::config::ClientConfig;
use crate::csrf::CsrfTokenProvider;
use crate::http::{RequestConfig, RequestExecutor};
use crate::normalize;
use crate::pipeline::RequestPipeline;

const USER_AGENT: &str = concat!("stockarc-client/", env!("CARGO_PKG_VERSION"));

/// High-level client for the StockArc backend.
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    session: Arc<dyn SessionStore>,
    pipeline: RequestPipeline,
}

impl ApiClient {
    /// Creates a client from a config and an injected session store.
    ///
    /// # Arguments
    ///
    /// * `config` - Base URL and default timeout
    /// * `session` - Holder of the bearer token; inject a shared instance to
    ///   observe refreshes from outside the client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed
    /// or the base URL does not parse.
    pub fn new(config: ClientConfig, session: Arc<dyn SessionStore>) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .user_agent(USER_AGENT)
            .no_proxy()
            .build()
            .map_err(|e| AppError::unknown(format!("Failed to build HTTP client: {e}")))?;

        let csrf = Arc::new(CsrfTokenProvider::new(
            http.clone(),
            jar,
            &config.base_url,
            config.timeout,
        )?);
        let executor = Arc::new(RequestExecutor::new(
            http.clone(),
            config.base_url.clone(),
            Arc::clone(&session),
            Arc::clone(&csrf),
        ));
        let coordinator = Arc::new(RefreshCoordinator::new(
            http.clone(),
            &config.base_url,
            Arc::clone(&session),
            config.timeout,
        ));
        let pipeline = RequestPipeline::new(executor, coordinator, csrf);

        Ok(Self {
            http,
            config,
            session,
            pipeline,
        })
    }

    /// Creates a builder for fluent configuration.
    #[must_use]
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Executes a GET request.
    ///
    /// # Errors
    ///
    /// Returns the normalized error if the request fails or the response
    /// cannot be deserialized.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.request(Method::GET, path)).await
    }

    /// Executes a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the normalized error if the body cannot be serialized, the
    /// request fails, or the response cannot be deserialized.
    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let body = to_body(body)?;
        self.execute(self.request(Method::POST, path).with_body(body)).await
    }

    /// Executes a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the normalized error if the body cannot be serialized, the
    /// request fails, or the response cannot be deserialized.
    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let body = to_body(body)?;
        self.execute(self.request(Method::PUT, path).with_body(body)).await
    }

    /// Executes a PATCH request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the normalized error if the body cannot be serialized, the
    /// request fails, or the response cannot be deserialized.
    pub async fn patch<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let body = to_body(body)?;
        self.execute(self.request(Method::PATCH, path).with_body(body)).await
    }

    /// Executes a DELETE request.
    ///
    /// Most StockArc DELETE endpoints answer 204; call as `delete::<()>` for
    /// those.
    ///
    /// # Errors
    ///
    /// Returns the normalized error if the request fails or the response
    /// cannot be deserialized.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.request(Method::DELETE, path)).await
    }

    /// Executes a fully custom request through the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the normalized error for any unrecovered failure.
    pub async fn execute<T: DeserializeOwned>(&self, config: RequestConfig) -> Result<T> {
        self.pipeline.execute(config).await
    }

    /// Executes a fully custom request and returns the raw unwrapped payload.
    ///
    /// # Errors
    ///
    /// Returns the normalized error for any unrecovered failure.
    pub async fn execute_value(&self, config: RequestConfig) -> Result<Value> {
        self.pipeline.execute_value(config).await
    }

    /// Probes the backend health endpoint.
    ///
    /// Skips auth, CSRF, and the retry pipeline entirely; a short timeout
    /// keeps startup probes snappy.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport failures; an unhealthy backend
    /// answers `Ok(false)`.
    pub async fn health_check(&self) -> Result<bool> {
        let timeout = Duration::from_millis(HEALTH_CHECK_TIMEOUT_MS);
        let url = format!("{}{HEALTH_PATH}", self.config.base_url);

        debug!(url = %url, "health check");

        let send = self.http.get(&url).send();
        match tokio::time::timeout(timeout, send).await {
            Ok(Ok(response)) => Ok(response.status().is_success()),
            Ok(Err(err)) => Err(normalize::transport(err)),
            Err(_) => Err(normalize::attempt_timeout(timeout)),
        }
    }

    /// The session store this client reads tokens from.
    #[must_use]
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestConfig {
        RequestConfig::new(method, path).with_timeout(self.config.timeout)
    }
}

fn to_body<B: Serialize>(body: &B) -> Result<Value> {
    serde_json::to_value(body)
        .map_err(|e| AppError::unknown(format!("Failed to serialize request body: {e}")))
}

/// Fluent builder for [`ApiClient`].
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    session: Option<Arc<dyn SessionStore>>,
}

impl ApiClientBuilder {
    /// Sets the client configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Injects a session store shared with the rest of the application.
    #[must_use]
    pub fn session(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    /// Builds the client, defaulting anything unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn build(self) -> Result<ApiClient> {
        let config = self.config.unwrap_or_default();
        let session = self
            .session
            .unwrap_or_else(|| Arc::new(AuthSession::new()));
        ApiClient::new(config, session)
    }
}
