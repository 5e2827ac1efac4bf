//! Defines the transaction record and its kind.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::user::UserID;

/// Alias for the integer type used for transaction IDs.
pub type TransactionID = i64;

/// Whether a transaction adds to or subtracts from the balance.
///
/// The kind does not constrain the sign of the amount; an income with a
/// negative amount is stored as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in, counted towards the income total.
    Income,
    /// Money going out, counted towards the expense total.
    Expense,
}

impl TransactionKind {
    /// Parse a kind from its external string form, ignoring case.
    ///
    /// Returns `None` for anything other than `income` or `expense`.
    pub fn parse(raw_kind: &str) -> Option<Self> {
        match raw_kind.to_ascii_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// The external string form of the kind, as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An income or expense record owned by a single user.
///
/// Transactions are created through the ledger's add operation and never
/// updated or deleted. The date is an opaque string in the form the client
/// submitted it; it is not validated as a calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The transaction's ID in the application database.
    pub id: TransactionID,
    /// Whether this is an income or an expense.
    pub kind: TransactionKind,
    /// A short description of the transaction.
    pub description: String,
    /// The amount of money, in unspecified currency units.
    pub amount: f64,
    /// The date the transaction happened, stored verbatim.
    pub date: String,
    /// The user that owns this transaction.
    pub user_id: UserID,
}
