//! Registered users.

use serde::{Deserialize, Serialize};

/// The public view of a registered user. Never carries the password digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:       String,
  pub email:    String,
  #[serde(default)]
  pub username: String,
}

impl User {
  /// The character shown in an avatar badge.
  pub fn initial(&self) -> char {
    self
      .username
      .chars()
      .next()
      .and_then(|c| c.to_uppercase().next())
      .unwrap_or('A')
  }
}

/// A user as persisted under `auth_users_v1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
  #[serde(flatten)]
  pub user:          User,
  /// Lowercase hex SHA-256 of the password.
  pub password_hash: String,
}

impl StoredUser {
  /// Case-insensitive email match; surrounding whitespace is ignored.
  pub fn has_email(&self, email: &str) -> bool {
    self.user.email.trim().to_lowercase() == email.trim().to_lowercase()
  }
}
