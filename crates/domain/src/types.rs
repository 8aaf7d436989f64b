//! Backend wire types
//!
//! The backend wraps successful JSON responses in a uniform envelope
//! (`{"isOk": true, "data": ...}`) and reports failures either through the
//! same envelope or as a bare object carrying `code`/`rcode` and `message`
//! fields. Parsing here is lenient by construction: malformed bodies degrade
//! to captured raw payloads instead of parse errors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ErrorCode;

/// Typed view of the backend's success envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    /// Whether the backend considered the operation successful.
    pub is_ok: bool,
    /// The actual payload.
    pub data: T,
}

/// Unwraps the backend envelope, when present.
///
/// A body shaped like `{"isOk": ..., "data": ...}` (both keys present)
/// yields the `data` value; any other body is returned unchanged, so
/// endpoints replying with bare payloads keep working.
#[must_use]
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("isOk") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Refresh endpoint payload, after envelope unwrapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenPayload {
    /// The replacement bearer token.
    pub access_token: String,
}

/// CSRF fetch endpoint payload, after envelope unwrapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenPayload {
    /// Token to echo back in the CSRF request header.
    pub csrf_token: String,
}

/// Lenient view of a non-2xx response body.
///
/// Failure bodies arrive in two shapes: enveloped
/// (`{"isOk": false, "data": {"rcode": ..., "message": ...}}`) and bare
/// (`{"code": ..., "message": ...}`). Both are accepted; the original body is
/// retained in `raw` for diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorBody {
    /// Backend-internal error code (the `rcode` field).
    pub rcode: Option<String>,
    /// Alternative error code field used by some endpoints.
    pub code: Option<String>,
    /// Backend-supplied human-readable message.
    pub message: Option<String>,
    /// The original body, when it could be captured.
    pub raw: Option<Value>,
}

impl ErrorBody {
    /// Extracts error fields from a JSON body.
    #[must_use]
    pub fn from_value(body: Value) -> Self {
        let (rcode, code, message) = match &body {
            Value::Object(map) => {
                // Enveloped failures carry their fields under `data`.
                let fields = match map.get("data") {
                    Some(Value::Object(inner)) if map.contains_key("isOk") => inner,
                    _ => map,
                };
                let string_field =
                    |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_owned);
                (string_field("rcode"), string_field("code"), string_field("message"))
            }
            _ => (None, None, None),
        };
        Self { rcode, code, message, raw: Some(body) }
    }

    /// Parses a raw body, tolerating non-JSON payloads.
    ///
    /// Non-JSON text is retained in `raw` only; an empty body yields an empty
    /// `ErrorBody`.
    #[must_use]
    pub fn from_text(body: &str) -> Self {
        if body.is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(_) => Self { raw: Some(Value::String(body.to_owned())), ..Self::default() },
        }
    }

    /// The backend error code, preferring `rcode` over `code`.
    #[must_use]
    pub fn backend_code(&self) -> Option<&str> {
        self.rcode.as_deref().or(self.code.as_deref())
    }

    /// The backend code parsed into the closed taxonomy, when it fits.
    #[must_use]
    pub fn normalized_code(&self) -> Option<ErrorCode> {
        self.backend_code().and_then(ErrorCode::parse)
    }

    /// Whether the body carries the CSRF-rejection signature: an error code
    /// equal to `CSRF_ERROR`, or a message mentioning CSRF.
    #[must_use]
    pub fn is_csrf_rejection(&self) -> bool {
        if self.normalized_code() == Some(ErrorCode::CsrfError) {
            return true;
        }
        self.message.as_deref().is_some_and(|m| m.to_ascii_uppercase().contains("CSRF"))
    }
}
