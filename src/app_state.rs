//! Implements a struct that holds the state of the web server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};

use crate::{
    credentials::SqliteCredentialStore,
    db::{StorageError, initialize},
    ledger::SqliteTransactionLedger,
    session::{DEFAULT_SESSION_DURATION, SessionAuthenticator},
};

/// The state of the web server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The store for user identity records.
    pub credentials: SqliteCredentialStore,

    /// The authenticator that maps session tokens to users.
    pub sessions: SessionAuthenticator,

    /// The ledger for the users' transactions.
    pub ledger: SqliteTransactionLedger,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models, and construct the session authenticator that all
    /// protected routes resolve users through.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, cookie_secret: &str) -> Result<Self, StorageError> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));
        let credentials = SqliteCredentialStore::new(connection.clone());
        let sessions = SessionAuthenticator::new(credentials.clone(), DEFAULT_SESSION_DURATION);

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            credentials,
            sessions,
            ledger: SqliteTransactionLedger::new(connection),
        })
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret` string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}
