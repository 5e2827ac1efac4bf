//! Database initialization and the error type for persistence failures.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{credentials, ledger};

/// An unexpected failure in the underlying SQLite storage.
///
/// Domain errors such as duplicate usernames are mapped onto their own
/// variants before reaching this type; anything left over is surfaced here
/// and should be treated as fatal to the current operation. No retries are
/// performed.
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("an unexpected SQL error occurred: {0}")]
pub struct StorageError(pub rusqlite::Error);

impl From<rusqlite::Error> for StorageError {
    fn from(error: rusqlite::Error) -> Self {
        Self(error)
    }
}

/// Create the application tables if they do not already exist.
///
/// Foreign key enforcement is switched on for the connection so that a
/// transaction row cannot be inserted without a valid owning user.
///
/// # Errors
///
/// Returns a [StorageError] if the schema could not be created. The schema
/// is created inside an exclusive SQLite transaction, so on error the
/// database is left untouched.
pub fn initialize(connection: &Connection) -> Result<(), StorageError> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    credentials::create_user_table(&transaction)?;
    ledger::create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
