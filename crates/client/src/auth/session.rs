//! In-memory bearer token storage.

use parking_lot::RwLock;

/// Seam between the request layer and whatever holds the access token.
///
/// The refresh coordinator calls [`Self::update_access_token`] after a
/// successful refresh; logout flows outside this crate call
/// [`Self::clear_access_token`]. The token is only ever replaced wholesale,
/// never edited in place.
pub trait SessionStore: Send + Sync {
    /// Current bearer token, if the session holds one.
    fn access_token(&self) -> Option<String>;

    /// Replaces the stored token wholesale.
    fn update_access_token(&self, token: String);

    /// Drops the stored token.
    fn clear_access_token(&self);
}

/// Default in-memory session store.
///
/// One instance per client; tests construct isolated instances instead of
/// sharing process-global state.
#[derive(Debug, Default)]
pub struct AuthSession {
    token: RwLock<Option<String>>,
}

impl AuthSession {
    /// Creates an unauthenticated session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session already holding a token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self { token: RwLock::new(Some(token.into())) }
    }

    /// Whether the session currently holds a token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }
}

impl SessionStore for AuthSession {
    fn access_token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn update_access_token(&self, token: String) {
        *self.token.write() = Some(token);
    }

    fn clear_access_token(&self) {
        self.token.write().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates the fresh session scenario.
    ///
    /// Assertions:
    /// - Ensures `!session.is_authenticated()` evaluates to true.
    /// - Confirms `session.access_token()` equals `None`.
    #[test]
    fn test_new_session_is_unauthenticated() {
        let session = AuthSession::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.access_token(), None);
    }

    /// Validates `SessionStore::update_access_token` behavior for the store
    /// and replace scenario.
    ///
    /// Assertions:
    /// - Confirms the stored token is returned wholesale.
    /// - Confirms a second update replaces the first token entirely.
    #[test]
    fn test_update_replaces_token_wholesale() {
        let session = AuthSession::with_token("first");
        assert_eq!(session.access_token(), Some("first".to_string()));

        session.update_access_token("second".to_string());
        assert_eq!(session.access_token(), Some("second".to_string()));
        assert!(session.is_authenticated());
    }

    /// Validates `SessionStore::clear_access_token` behavior for the logout
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures `!session.is_authenticated()` evaluates to true after clear.
    #[test]
    fn test_clear_drops_token() {
        let session = AuthSession::with_token("tok");
        session.clear_access_token();
        assert!(!session.is_authenticated());
        assert_eq!(session.access_token(), None);
    }
}
