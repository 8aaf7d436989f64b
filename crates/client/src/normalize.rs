//! Normalization of raw failures into domain errors.
//!
//! Every failure the client observes funnels through this module before it
//! reaches a caller: transport errors, per-attempt timeouts, caller
//! cancellation and non-2xx responses all collapse into [`AppError`]. The
//! functions here are total and never panic. A value that is already an
//! `AppError` propagates with `?` untouched, so normalization happens exactly
//! once per failure.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use stockarc_domain::{AppError, ErrorBody, ErrorCode};

/* -------------------------------------------------------------------------- */
/* Transport failures */
/* -------------------------------------------------------------------------- */

/// Maps a transport-level failure onto the taxonomy.
///
/// Timeouts keep their own code so callers can distinguish "server slow"
/// from "server unreachable"; body-decoding failures are not transport
/// problems and map to `Unknown`.
#[must_use]
pub fn transport(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        return AppError::timeout("HTTP request timed out");
    }
    if err.is_connect() {
        return AppError::network("HTTP connection failure")
            .with_details(Value::String(err.to_string()));
    }
    if err.is_decode() {
        return AppError::unknown("Failed to read response body")
            .with_details(Value::String(err.to_string()));
    }
    AppError::network(err.to_string())
}

/// Error for an attempt that exceeded its deadline.
#[must_use]
pub fn attempt_timeout(timeout: Duration) -> AppError {
    AppError::timeout(format!("Request timed out after {}ms", timeout.as_millis()))
}

/// Error for an attempt cancelled through the caller's token.
#[must_use]
pub fn cancelled() -> AppError {
    AppError::timeout("Request cancelled by caller")
}

/* -------------------------------------------------------------------------- */
/* HTTP failures */
/* -------------------------------------------------------------------------- */

/// Maps a non-2xx response onto the taxonomy.
///
/// The HTTP status picks the base code; a backend-supplied code in the body
/// (`rcode` preferred over `code`) overrides it when it parses into the
/// closed set. The backend message, when present, becomes the error message;
/// the raw body rides along in `details` for diagnostics.
#[must_use]
pub fn http_failure(status: StatusCode, body: &ErrorBody) -> AppError {
    let code = body.normalized_code().unwrap_or_else(|| ErrorCode::from_status(status.as_u16()));
    let message = body.message.clone().unwrap_or_else(|| code.default_message().to_string());

    let mut err = AppError::new(code, message).with_status(status.as_u16());
    if let Some(raw) = &body.raw {
        err = err.with_details(raw.clone());
    }
    err
}

/// Error for a 2xx payload that does not deserialize into the caller's type.
#[must_use]
pub fn decode(err: &serde_json::Error) -> AppError {
    AppError::unknown(format!("Failed to decode response: {err}"))
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn connection_refused_maps_to_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so the request fails with ECONNREFUSED

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let err = client.get(format!("http://{addr}/stock")).send().await.unwrap_err();

        let mapped = transport(err);
        assert_eq!(mapped.code, ErrorCode::NetworkError);
        assert!(mapped.status.is_none());
    }

    #[tokio::test]
    async fn client_timeout_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let err = client.get(server.uri()).send().await.unwrap_err();
        assert!(err.is_timeout());

        assert_eq!(transport(err).code, ErrorCode::Timeout);
    }

    #[test]
    fn backend_code_overrides_status() {
        let body = ErrorBody::from_value(json!({
            "isOk": false,
            "data": {"rcode": "VALIDATION_ERROR", "message": "quantity must be positive"}
        }));

        let err = http_failure(StatusCode::BAD_REQUEST, &body);
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.status, Some(400));
        assert_eq!(err.message, "quantity must be positive");
    }

    #[test]
    fn status_maps_when_no_backend_code() {
        let err = http_failure(StatusCode::NOT_FOUND, &ErrorBody::default());
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, ErrorCode::NotFound.default_message());
        assert_eq!(err.status, Some(404));
    }

    #[test]
    fn unparseable_backend_code_falls_back_to_status() {
        let body = ErrorBody::from_value(json!({"rcode": "SOMETHING_NEW"}));
        let err = http_failure(StatusCode::INTERNAL_SERVER_ERROR, &body);
        assert_eq!(err.code, ErrorCode::ServerError);
    }

    #[test]
    fn timeout_helpers_use_timeout_code() {
        assert_eq!(attempt_timeout(Duration::from_millis(250)).code, ErrorCode::Timeout);
        assert_eq!(cancelled().code, ErrorCode::Timeout);
    }
}
