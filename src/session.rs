//! The session authenticator: bridges requests to an authenticated identity
//! and manages the session lifecycle.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use time::{Duration, OffsetDateTime};

use crate::{
    credentials::{CredentialError, SqliteCredentialStore},
    db::StorageError,
    user::{User, UserID},
};

/// The default duration for which a session is valid after log-in.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::minutes(30);

/// Errors that can occur while logging in or resolving a session.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AuthError {
    /// The username or password was wrong.
    ///
    /// Unknown usernames and wrong passwords produce this same variant so
    /// that log-in failures do not reveal which usernames exist.
    #[error("incorrect username or password")]
    InvalidCredentials,

    /// The operation requires a logged-in user but there is no valid session.
    /// The caller should redirect the client to the log-in page.
    #[error("not logged in")]
    Unauthenticated,

    /// An unhandled/unexpected SQL error.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<CredentialError> for AuthError {
    fn from(error: CredentialError) -> Self {
        match error {
            CredentialError::Storage(inner) => AuthError::Storage(inner),
            // User lookups only ever fail with storage errors.
            _ => AuthError::InvalidCredentials,
        }
    }
}

/// An opaque handle identifying an authenticated session.
///
/// The token value is 32 random bytes rendered as hex. It carries no user
/// information itself; the mapping to a user lives inside the
/// [SessionAuthenticator].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    fn generate() -> Self {
        let bytes: [u8; 32] = rand::random();
        let token = bytes.iter().map(|byte| format!("{byte:02x}")).collect();

        Self(token)
    }

    /// Reconstruct a token from its string form, e.g. a cookie value.
    pub fn from_raw(raw_token: &str) -> Self {
        Self(raw_token.to_string())
    }

    /// The token's string form, suitable for storing in a cookie.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct Session {
    user_id: UserID,
    expires_at: OffsetDateTime,
}

/// Verifies credentials and tracks which session tokens map to which users.
///
/// Constructed once at process start; all components that need to know "who
/// is making this request" go through this gate. Session state is held
/// in-process behind a mutex and cleared on shutdown.
#[derive(Debug, Clone)]
pub struct SessionAuthenticator {
    credentials: SqliteCredentialStore,
    sessions: Arc<Mutex<HashMap<SessionToken, Session>>>,
    session_duration: Duration,
}

impl SessionAuthenticator {
    /// Create a new authenticator that resolves users through `credentials`.
    ///
    /// Sessions expire `session_duration` after log-in; pass
    /// [DEFAULT_SESSION_DURATION] for the default.
    pub fn new(credentials: SqliteCredentialStore, session_duration: Duration) -> Self {
        Self {
            credentials,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            session_duration,
        }
    }

    /// The duration for which new sessions are valid.
    pub fn session_duration(&self) -> Duration {
        self.session_duration
    }

    /// Verify the given credentials and establish a new session.
    ///
    /// Expired sessions whose tokens were never presented again are reaped
    /// here, so the session map does not grow for the life of the process.
    ///
    /// # Panics
    ///
    /// Panics if the session lock is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [AuthError::InvalidCredentials] if the username does not exist
    /// or the password is wrong (deliberately indistinguishable), or
    /// [AuthError::Storage] if the user lookup failed.
    pub fn login(&self, username: &str, password: &str) -> Result<SessionToken, AuthError> {
        let user = self
            .credentials
            .find_by_username(username)?
            .ok_or(AuthError::InvalidCredentials)?;

        let password_matches = user.password_hash().verify(password).unwrap_or_else(|error| {
            tracing::error!("an error occurred while verifying a password: {error}");
            false
        });

        if !password_matches {
            return Err(AuthError::InvalidCredentials);
        }

        let now = OffsetDateTime::now_utc();
        let token = SessionToken::generate();
        let session = Session {
            user_id: user.id(),
            expires_at: now + self.session_duration,
        };

        let mut sessions = self
            .sessions
            .lock()
            .expect("Could not acquire session lock");
        sessions.retain(|_, existing| existing.expires_at > now);
        sessions.insert(token.clone(), session);

        Ok(token)
    }

    /// Invalidate the session for `token`.
    ///
    /// Subsequent use of the same token resolves to no user. Unknown tokens
    /// are ignored.
    ///
    /// # Panics
    ///
    /// Panics if the session lock is poisoned.
    pub fn logout(&self, token: &SessionToken) {
        self.sessions
            .lock()
            .expect("Could not acquire session lock")
            .remove(token);
    }

    /// Resolve a session token to the user it belongs to.
    ///
    /// Returns `None` for unknown and expired tokens; expired sessions are
    /// dropped on access.
    ///
    /// # Panics
    ///
    /// Panics if the session lock is poisoned.
    ///
    /// # Errors
    ///
    /// Returns an [AuthError::Storage] if the user lookup failed.
    pub fn current_user(&self, token: &SessionToken) -> Result<Option<User>, AuthError> {
        let session = {
            let mut sessions = self
                .sessions
                .lock()
                .expect("Could not acquire session lock");

            match sessions.get(token) {
                Some(session) if session.expires_at <= OffsetDateTime::now_utc() => {
                    sessions.remove(token);
                    return Ok(None);
                }
                Some(session) => *session,
                None => return Ok(None),
            }
        };

        Ok(self.credentials.find_by_id(session.user_id)?)
    }

    /// Resolve a session token to a user, or fail with
    /// [AuthError::Unauthenticated].
    ///
    /// Convenience for protected operations; the caller is responsible for
    /// redirecting to the log-in page on failure.
    ///
    /// # Panics
    ///
    /// Panics if the session lock is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [AuthError::Unauthenticated] if `token` is absent, unknown, or
    /// expired, or [AuthError::Storage] if the user lookup failed.
    pub fn require_authenticated(&self, token: Option<&SessionToken>) -> Result<User, AuthError> {
        let token = token.ok_or(AuthError::Unauthenticated)?;

        self.current_user(token)?.ok_or(AuthError::Unauthenticated)
    }

    /// Drop all sessions, e.g. on process shutdown.
    ///
    /// # Panics
    ///
    /// Panics if the session lock is poisoned.
    pub fn clear(&self) {
        self.sessions
            .lock()
            .expect("Could not acquire session lock")
            .clear();
    }
}

#[cfg(test)]
mod session_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::Duration;

    use crate::credentials::{SqliteCredentialStore, create_user_table};

    use super::{AuthError, DEFAULT_SESSION_DURATION, SessionAuthenticator, SessionToken};

    fn get_authenticator(session_duration: Duration) -> SessionAuthenticator {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        let credentials = SqliteCredentialStore::new(Arc::new(Mutex::new(conn)));
        credentials
            .create_user("alice", "hunter2", 4)
            .expect("Could not create test user");

        SessionAuthenticator::new(credentials, session_duration)
    }

    #[test]
    fn login_succeeds_with_correct_credentials() {
        let authenticator = get_authenticator(DEFAULT_SESSION_DURATION);

        let token = authenticator.login("alice", "hunter2").unwrap();

        let user = authenticator.current_user(&token).unwrap().unwrap();
        assert_eq!(user.username().as_ref(), "alice");
    }

    #[test]
    fn login_fails_with_wrong_password() {
        let authenticator = get_authenticator(DEFAULT_SESSION_DURATION);

        let result = authenticator.login("alice", "wrong");

        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[test]
    fn unknown_user_and_wrong_password_are_indistinguishable() {
        let authenticator = get_authenticator(DEFAULT_SESSION_DURATION);

        let unknown_user_error = authenticator.login("mallory", "hunter2").unwrap_err();
        let wrong_password_error = authenticator.login("alice", "wrong").unwrap_err();

        assert_eq!(unknown_user_error, wrong_password_error);
        assert_eq!(unknown_user_error, AuthError::InvalidCredentials);
    }

    #[test]
    fn login_issues_unique_tokens() {
        let authenticator = get_authenticator(DEFAULT_SESSION_DURATION);

        let first = authenticator.login("alice", "hunter2").unwrap();
        let second = authenticator.login("alice", "hunter2").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn logout_invalidates_session() {
        let authenticator = get_authenticator(DEFAULT_SESSION_DURATION);
        let token = authenticator.login("alice", "hunter2").unwrap();

        authenticator.logout(&token);

        assert_eq!(authenticator.current_user(&token), Ok(None));
    }

    #[test]
    fn current_user_returns_none_for_unknown_token() {
        let authenticator = get_authenticator(DEFAULT_SESSION_DURATION);

        let token = SessionToken::from_raw("not a real token");

        assert_eq!(authenticator.current_user(&token), Ok(None));
    }

    #[test]
    fn current_user_returns_none_for_expired_session() {
        let authenticator = get_authenticator(Duration::seconds(-1));

        let token = authenticator.login("alice", "hunter2").unwrap();

        assert_eq!(authenticator.current_user(&token), Ok(None));
    }

    #[test]
    fn require_authenticated_succeeds_with_valid_session() {
        let authenticator = get_authenticator(DEFAULT_SESSION_DURATION);
        let token = authenticator.login("alice", "hunter2").unwrap();

        let user = authenticator.require_authenticated(Some(&token)).unwrap();

        assert_eq!(user.username().as_ref(), "alice");
    }

    #[test]
    fn require_authenticated_fails_without_token() {
        let authenticator = get_authenticator(DEFAULT_SESSION_DURATION);

        let result = authenticator.require_authenticated(None);

        assert_eq!(result.unwrap_err(), AuthError::Unauthenticated);
    }

    #[test]
    fn require_authenticated_fails_after_logout() {
        let authenticator = get_authenticator(DEFAULT_SESSION_DURATION);
        let token = authenticator.login("alice", "hunter2").unwrap();

        authenticator.logout(&token);

        let result = authenticator.require_authenticated(Some(&token));
        assert_eq!(result.unwrap_err(), AuthError::Unauthenticated);
    }

    #[test]
    fn login_reaps_expired_sessions() {
        let authenticator = get_authenticator(Duration::seconds(-1));
        let stale_token = authenticator.login("alice", "hunter2").unwrap();

        let fresh_token = authenticator.login("alice", "hunter2").unwrap();

        let sessions = authenticator.sessions.lock().unwrap();
        assert!(!sessions.contains_key(&stale_token));
        assert!(sessions.contains_key(&fresh_token));
    }

    #[test]
    fn clear_drops_all_sessions() {
        let authenticator = get_authenticator(DEFAULT_SESSION_DURATION);
        let token = authenticator.login("alice", "hunter2").unwrap();

        authenticator.clear();

        assert_eq!(authenticator.current_user(&token), Ok(None));
    }
}
