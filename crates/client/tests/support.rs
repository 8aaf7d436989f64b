// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use stockarc_client::{ApiClient, AuthSession, ClientConfig};
use wiremock::MockServer;

/// Shared context for integration tests that drive the full client stack
/// against a mock backend.
pub struct TestHarness {
    /// Mock backend; mount expectations here.
    pub server: MockServer,
    /// Session store shared with the client, for token assertions.
    pub session: Arc<AuthSession>,
    /// Client under test, wired to `server` and `session`.
    pub client: Arc<ApiClient>,
}

/// Create a harness whose session holds no token yet.
pub async fn setup_harness() -> TestHarness {
    build_harness(AuthSession::new()).await
}

/// Create a harness whose session already holds `token`.
pub async fn setup_authed_harness(token: &str) -> TestHarness {
    build_harness(AuthSession::with_token(token)).await
}

async fn build_harness(session: AuthSession) -> TestHarness {
    let server = MockServer::start().await;
    let session = Arc::new(session);
    let client = ApiClient::builder()
        .config(ClientConfig::new(server.uri()))
        .session(session.clone())
        .build()
        .expect("failed to build client");

    TestHarness { server, session, client: Arc::new(client) }
}

/// Success envelope wrapping `data`.
pub fn ok_body(data: Value) -> Value {
    json!({ "isOk": true, "data": data })
}

/// Error envelope carrying a backend `rcode` and message.
pub fn error_body(rcode: &str, message: &str) -> Value {
    json!({ "isOk": false, "data": { "rcode": rcode, "message": message } })
}

/// Envelope the refresh endpoint answers with on success.
pub fn token_body(token: &str) -> Value {
    json!({ "isOk": true, "data": { "accessToken": token } })
}

/// Envelope the CSRF endpoint answers with.
pub fn csrf_body(token: &str) -> Value {
    json!({ "isOk": true, "data": { "csrfToken": token } })
}
