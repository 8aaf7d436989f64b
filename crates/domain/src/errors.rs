//! Error types used throughout the StockArc client
//!
//! Every failure the client can produce — transport, timeout, HTTP status,
//! refresh, body parsing — collapses into a single [`AppError`] carrying one
//! of the closed [`ErrorCode`] values. Callers never observe a raw transport
//! or serialization error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Closed set of normalized error codes.
///
/// Serialized as `SCREAMING_SNAKE_CASE`, which is also the vocabulary the
/// backend uses for its `rcode` field, so backend-supplied codes parse
/// directly into this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Transport-level connectivity failure (DNS, refused connection, reset).
    NetworkError,
    /// The attempt was cancelled, by its deadline or by the caller.
    Timeout,
    /// Session is missing, expired, or could not be refreshed.
    Unauthorized,
    /// Authenticated but not allowed to perform the operation.
    Forbidden,
    /// The requested resource does not exist.
    NotFound,
    /// The backend rejected the request payload.
    ValidationError,
    /// The backend failed with a 5xx status.
    ServerError,
    /// CSRF token missing, stale, or rejected.
    CsrfError,
    /// Anything that does not fit the categories above.
    Unknown,
}

impl ErrorCode {
    /// Maps an HTTP status code to its normalized error code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            422 => Self::ValidationError,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Parses a backend code string (`"CSRF_ERROR"`, ...).
    ///
    /// Returns `None` for anything outside the closed set, so an unknown
    /// backend vocabulary never widens the taxonomy.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "NETWORK_ERROR" => Some(Self::NetworkError),
            "TIMEOUT" => Some(Self::Timeout),
            "UNAUTHORIZED" => Some(Self::Unauthorized),
            "FORBIDDEN" => Some(Self::Forbidden),
            "NOT_FOUND" => Some(Self::NotFound),
            "VALIDATION_ERROR" => Some(Self::ValidationError),
            "SERVER_ERROR" => Some(Self::ServerError),
            "CSRF_ERROR" => Some(Self::CsrfError),
            "UNKNOWN" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Wire-format name of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NetworkError => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ServerError => "SERVER_ERROR",
            Self::CsrfError => "CSRF_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Whether callers may reasonably retry the operation later.
    ///
    /// `Unauthorized` is terminal for the session and `ValidationError` is
    /// terminal for the request, so neither is listed.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::NetworkError | Self::Timeout | Self::ServerError)
    }

    /// Fallback message for the code, safe to show to end users.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::NetworkError => "Could not reach the server. Check your connection.",
            Self::Timeout => "The request timed out.",
            Self::Unauthorized => "Your session has expired. Please sign in again.",
            Self::Forbidden => "You do not have permission to do that.",
            Self::NotFound => "The requested resource was not found.",
            Self::ValidationError => "Some of the submitted data is invalid.",
            Self::ServerError => "The server encountered an error. Try again later.",
            Self::CsrfError => "The request could not be verified. Try again.",
            Self::Unknown => "Something went wrong.",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one error shape surfaced to callers.
///
/// Once constructed an `AppError` is never re-wrapped: it propagates through
/// the client unchanged, so the `code`/`status` pair a caller observes is the
/// one produced at the failure site.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct AppError {
    /// Normalized error category.
    pub code: ErrorCode,
    /// HTTP status of the failing response, when one was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Human-readable description.
    pub message: String,
    /// Original failure payload, kept for diagnostics only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl AppError {
    /// Creates an error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, status: None, message: message.into(), details: None }
    }

    /// Creates an error carrying the code's default user-facing message.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Attaches the HTTP status of the failing response.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches the raw failure payload for diagnostics.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Shorthand for a [`ErrorCode::Timeout`] error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    /// Shorthand for a [`ErrorCode::NetworkError`] error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, message)
    }

    /// Shorthand for an [`ErrorCode::Unknown`] error.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unknown, message)
    }

    /// The `UNAUTHORIZED`/401 error every failed session refresh collapses
    /// into.
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message).with_status(401)
    }

    /// Whether callers may reasonably retry the operation later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.code.is_transient()
    }
}

/// Result type alias for StockArc operations
pub type Result<T> = std::result::Result<T, AppError>;
