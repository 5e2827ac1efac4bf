//! The transaction ledger: all read and write access to transaction records,
//! always scoped to a single user.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};

use crate::{
    db::StorageError,
    transaction::{Transaction, TransactionKind},
    user::UserID,
};

/// Errors that can occur while adding or querying transactions.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LedgerError {
    /// A required field was empty or absent. Contains the field name.
    #[error("the field '{0}' must be filled in")]
    MissingField(&'static str),

    /// The submitted amount does not parse as a finite decimal number.
    #[error("'{0}' is not a valid amount")]
    InvalidAmount(String),

    /// An unhandled/unexpected SQL error, including constraint violations
    /// such as a transaction referencing a user that does not exist.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(error: rusqlite::Error) -> Self {
        LedgerError::Storage(StorageError(error))
    }
}

/// The aggregate totals for one user's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    /// The sum of amounts over income transactions.
    pub total_income: f64,
    /// The sum of amounts over expense transactions.
    pub total_expense: f64,
    /// Income minus expenses.
    pub balance: f64,
}

/// Create the transaction table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                kind TEXT NOT NULL,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id)
                )",
        (),
    )?;

    Ok(())
}

/// Handles the creation and retrieval of transaction records.
#[derive(Debug, Clone)]
pub struct SqliteTransactionLedger {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteTransactionLedger {
    /// Create a new ledger that reads and writes transactions through
    /// `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    /// Validate the raw form fields and insert a new transaction owned by
    /// `user_id`.
    ///
    /// The date string is stored verbatim without calendar validation, and
    /// the sign of the amount is not checked against the kind. The insert is
    /// a single SQL statement, so a failure persists nothing.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [LedgerError::MissingField] if the kind, description, amount, or
    ///   date is empty, or the kind is not `income`/`expense`,
    /// - [LedgerError::InvalidAmount] if the amount does not parse as a
    ///   finite number,
    /// - [LedgerError::Storage] if `user_id` does not refer to an existing
    ///   user or some other SQL error occurred.
    pub fn add_transaction(
        &self,
        user_id: UserID,
        kind: &str,
        description: &str,
        amount: &str,
        date: &str,
    ) -> Result<Transaction, LedgerError> {
        let kind = match kind {
            "" => return Err(LedgerError::MissingField("kind")),
            kind => TransactionKind::parse(kind).ok_or(LedgerError::MissingField("kind"))?,
        };

        if description.is_empty() {
            return Err(LedgerError::MissingField("description"));
        }

        if amount.is_empty() {
            return Err(LedgerError::MissingField("amount"));
        }

        if date.is_empty() {
            return Err(LedgerError::MissingField("date"));
        }

        let parsed_amount: f64 = amount
            .parse()
            .map_err(|_| LedgerError::InvalidAmount(amount.to_string()))?;

        if !parsed_amount.is_finite() {
            return Err(LedgerError::InvalidAmount(amount.to_string()));
        }

        let connection = self
            .connection
            .lock()
            .expect("Could not acquire database lock");

        connection.execute(
            "INSERT INTO \"transaction\" (kind, description, amount, date, user_id) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                kind.as_str(),
                description,
                parsed_amount,
                date,
                user_id.as_i64(),
            ),
        )?;

        Ok(Transaction {
            id: connection.last_insert_rowid(),
            kind,
            description: description.to_string(),
            amount: parsed_amount,
            date: date.to_string(),
            user_id,
        })
    }

    /// Retrieve all transactions owned by `user_id`, in insertion order
    /// (ascending ID).
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    ///
    /// Returns a [LedgerError::Storage] if an SQL related error occurred.
    pub fn list_transactions(&self, user_id: UserID) -> Result<Vec<Transaction>, LedgerError> {
        self.connection
            .lock()
            .expect("Could not acquire database lock")
            .prepare(
                "SELECT id, kind, description, amount, date, user_id \
                 FROM \"transaction\" WHERE user_id = :user_id ORDER BY id ASC",
            )?
            .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
            .collect()
    }

    /// Compute the income, expense, and balance totals for `user_id`.
    ///
    /// A user with no transactions gets an all-zero summary. Summation uses
    /// the same f64 semantics as storage; no rounding is applied.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    ///
    /// Returns a [LedgerError::Storage] if an SQL related error occurred.
    pub fn summarize(&self, user_id: UserID) -> Result<Summary, LedgerError> {
        self.connection
            .lock()
            .expect("Could not acquire database lock")
            .prepare(
                "SELECT \
                    COALESCE(SUM(CASE WHEN kind = 'income' THEN amount END), 0.0), \
                    COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount END), 0.0) \
                 FROM \"transaction\" WHERE user_id = :user_id",
            )?
            .query_row(&[(":user_id", &user_id.as_i64())], |row| {
                let total_income: f64 = row.get(0)?;
                let total_expense: f64 = row.get(1)?;

                Ok(Summary {
                    total_income,
                    total_expense,
                    balance: total_income - total_expense,
                })
            })
            .map_err(|error| error.into())
    }
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_kind: String = row.get(1)?;
    let kind = TransactionKind::parse(&raw_kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown transaction kind '{raw_kind}'").into(),
        )
    })?;

    Ok(Transaction {
        id: row.get(0)?,
        kind,
        description: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
        user_id: UserID::new(row.get(5)?),
    })
}
