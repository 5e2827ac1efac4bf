//! Defines the user record and its supporting newtypes.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::{credentials::CredentialError, password::PasswordHash};

/// The maximum number of grapheme clusters allowed in a username.
const USERNAME_MAX_LENGTH: usize = 50;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A validated username.
///
/// Usernames are case-sensitive, between one and fifty grapheme clusters long,
/// and globally unique. Uniqueness is enforced by the credential store at
/// write time, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Create and validate a username from a string.
    ///
    /// # Errors
    ///
    /// Returns a [CredentialError::InvalidInput] if the username is empty or
    /// longer than fifty characters.
    pub fn new(raw_username: &str) -> Result<Self, CredentialError> {
        if raw_username.is_empty() {
            return Err(CredentialError::InvalidInput(
                "username must not be empty".to_string(),
            ));
        }

        if raw_username.graphemes(true).count() > USERNAME_MAX_LENGTH {
            return Err(CredentialError::InvalidInput(format!(
                "username must be at most {USERNAME_MAX_LENGTH} characters long"
            )));
        }

        Ok(Self(raw_username.to_string()))
    }

    /// Create a new `Username` without any validation.
    ///
    /// The caller should ensure that `raw_username` satisfies the length rules,
    /// e.g. because it was read back from the database.
    pub fn new_unchecked(raw_username: &str) -> Self {
        Self(raw_username.to_string())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered user of the application.
///
/// Users are created once at registration and never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    id: UserID,
    username: Username,
    password_hash: PasswordHash,
}

impl User {
    /// Create a new user.
    ///
    /// The caller should ensure that `id` is unique.
    pub fn new(id: UserID, username: Username, password_hash: PasswordHash) -> Self {
        Self {
            id,
            username,
            password_hash,
        }
    }

    /// The user's ID in the application database.
    pub fn id(&self) -> UserID {
        self.id
    }

    /// The name the user logs in with.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// The user's password hash.
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }
}

#[cfg(test)]
mod username_tests {
    use crate::credentials::CredentialError;

    use super::Username;

    #[test]
    fn new_fails_on_empty() {
        let result = Username::new("");

        assert!(matches!(result, Err(CredentialError::InvalidInput(_))));
    }

    #[test]
    fn new_fails_on_overlong_username() {
        let raw_username = "a".repeat(51);

        let result = Username::new(&raw_username);

        assert!(matches!(result, Err(CredentialError::InvalidInput(_))));
    }

    #[test]
    fn new_succeeds_at_length_limit() {
        let raw_username = "a".repeat(50);

        let result = Username::new(&raw_username);

        assert!(result.is_ok());
    }

    #[test]
    fn length_limit_counts_graphemes_not_bytes() {
        // 50 graphemes but far more than 50 bytes.
        let raw_username = "ü".repeat(50);

        let result = Username::new(&raw_username);

        assert!(result.is_ok());
    }

    #[test]
    fn usernames_are_case_sensitive() {
        let lower = Username::new("alice").unwrap();
        let upper = Username::new("Alice").unwrap();

        assert_ne!(lower, upper);
    }
}
