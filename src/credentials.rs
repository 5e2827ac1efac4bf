//! The credential store: durable storage and lookup of user identity records.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    db::StorageError,
    password::PasswordHash,
    user::{User, UserID, Username},
};

/// Errors that can occur during the creation or retrieval of a user.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CredentialError {
    /// The username or password did not pass validation. The message explains
    /// which field was rejected and why.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The username used to create the user is already taken. The client
    /// should try again with a different username.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// An unexpected error occurred in the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server,
    /// not shown to the client.
    #[error("hashing failed: {0}")]
    Hashing(String),

    /// An unhandled/unexpected SQL error.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<rusqlite::Error> for CredentialError {
    fn from(error: rusqlite::Error) -> Self {
        match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("user.username") =>
            {
                CredentialError::DuplicateUsername
            }
            error => CredentialError::Storage(StorageError(error)),
        }
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Handles the creation and retrieval of user records.
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCredentialStore {
    /// Create a new credential store that reads and writes users through
    /// `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    /// Create and insert a new user with the given username and password.
    ///
    /// The password is hashed with bcrypt at `cost` before it is persisted;
    /// the plaintext is never stored. Username uniqueness is enforced by the
    /// database's UNIQUE constraint rather than a check-then-act lookup, so
    /// concurrent registrations of the same username cannot both succeed.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [CredentialError::InvalidInput] if the username or password is empty
    ///   or the username is too long,
    /// - [CredentialError::DuplicateUsername] if the username is taken,
    /// - [CredentialError::Hashing] if the password could not be hashed,
    /// - [CredentialError::Storage] if an SQL related error occurred.
    pub fn create_user(
        &self,
        username: &str,
        raw_password: &str,
        cost: u32,
    ) -> Result<User, CredentialError> {
        let username = Username::new(username)?;
        let password_hash = PasswordHash::from_raw_password(raw_password, cost)?;

        let connection = self
            .connection
            .lock()
            .expect("Could not acquire database lock");

        connection.execute(
            "INSERT INTO user (username, password) VALUES (?1, ?2)",
            (username.as_ref(), password_hash.as_ref()),
        )?;

        let id = UserID::new(connection.last_insert_rowid());

        Ok(User::new(id, username, password_hash))
    }

    /// Get the user with the given username, or `None` if no such user exists.
    ///
    /// The lookup is an exact, case-sensitive match.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    ///
    /// Returns a [CredentialError::Storage] if an SQL related error occurred.
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, CredentialError> {
        self.connection
            .lock()
            .expect("Could not acquire database lock")
            .prepare("SELECT id, username, password FROM user WHERE username = :username")?
            .query_row(&[(":username", username)], map_user_row)
            .optional()
            .map_err(|error| error.into())
    }

    /// Get the user with the given ID, or `None` if no such user exists.
    ///
    /// Used to rehydrate the current user for an active session.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    ///
    /// Returns a [CredentialError::Storage] if an SQL related error occurred.
    pub fn find_by_id(&self, user_id: UserID) -> Result<Option<User>, CredentialError> {
        self.connection
            .lock()
            .expect("Could not acquire database lock")
            .prepare("SELECT id, username, password FROM user WHERE id = :id")?
            .query_row(&[(":id", &user_id.as_i64())], map_user_row)
            .optional()
            .map_err(|error| error.into())
    }
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let raw_username: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;

    Ok(User::new(
        UserID::new(raw_id),
        Username::new_unchecked(&raw_username),
        PasswordHash::new_unchecked(&raw_password_hash),
    ))
}
