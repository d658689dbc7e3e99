//! Local credential store and session lifecycle.
//!
//! Users live in one JSON list under `auth_users_v1`; the signed-in user's id
//! lives under `auth_session_v1`. Passwords are stored as an unsalted SHA-256
//! hex digest and compared with plain string equality. That is adequate for a
//! single-user local store only; it is not a safe scheme for networked
//! credentials.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  decode::{decode_list, decode_session, decode_users, local_part, raw_email},
  store::{RecordStore, keys},
  user::{StoredUser, User},
};

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Why an authentication operation was refused. `Display` output is meant
/// for the end user.
#[derive(Debug, Error)]
pub enum AuthError {
  #[error("enter a valid email address")]
  InvalidEmail,

  #[error("this email is already registered")]
  DuplicateEmail,

  #[error("password must be at least 6 characters")]
  WeakPassword,

  #[error("user not found")]
  UserNotFound,

  #[error("wrong password")]
  WrongPassword,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AuthError {
  fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

// ─── Digest ──────────────────────────────────────────────────────────────────

/// Lowercase hex SHA-256 of the UTF-8 password.
pub fn password_digest(password: &str) -> String {
  hex::encode(Sha256::digest(password.as_bytes()))
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// The in-process view of who is signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
  user: Option<User>,
}

impl Session {
  pub fn user(&self) -> Option<&User> { self.user.as_ref() }

  pub fn is_signed_in(&self) -> bool { self.user.is_some() }
}

// ─── SessionManager ──────────────────────────────────────────────────────────

/// Owns the registered-user set and the current [`Session`].
///
/// Every write is a read-modify-write against the store with no locking.
#[derive(Debug)]
pub struct SessionManager<S> {
  store:   Arc<S>,
  session: Session,
}

impl<S: RecordStore> SessionManager<S> {
  /// A manager with nobody signed in. Call
  /// [`restore_session`](Self::restore_session) to pick up a persisted
  /// session.
  pub fn new(store: Arc<S>) -> Self {
    Self { store, session: Session::default() }
  }

  pub fn session(&self) -> &Session { &self.session }

  pub fn current(&self) -> Option<&User> { self.session.user() }

  async fn load_users(&self) -> Result<Vec<StoredUser>, AuthError> {
    let raw = self
      .store
      .get(keys::USERS)
      .await
      .map_err(AuthError::store)?;
    Ok(raw.as_deref().map(decode_users).unwrap_or_default())
  }

  async fn persist_session(&mut self, user: User) -> Result<User, AuthError> {
    self
      .store
      .set(keys::SESSION, user.id.clone().into_bytes())
      .await
      .map_err(AuthError::store)?;
    self.session.user = Some(user.clone());
    Ok(user)
  }

  /// Register a new user and sign them in.
  ///
  /// A blank `username` defaults to the local part of `email`. Checks run in
  /// order: email shape, then [`AuthError::DuplicateEmail`], then password
  /// strength. Stored entries that fail to decode are kept, and their emails
  /// still count as taken.
  pub async fn sign_up(
    &mut self,
    username: &str,
    email: &str,
    password: &str,
  ) -> Result<User, AuthError> {
    let email = email.trim();
    if !email.contains('@') || local_part(email).is_empty() {
      return Err(AuthError::InvalidEmail);
    }

    let raw = self
      .store
      .get(keys::USERS)
      .await
      .map_err(AuthError::store)?;
    let mut items = raw
      .as_deref()
      .map(|bytes| decode_list(bytes, "users"))
      .unwrap_or_default();
    let wanted = email.to_lowercase();
    if items
      .iter()
      .filter_map(raw_email)
      .any(|taken| taken.to_lowercase() == wanted)
    {
      return Err(AuthError::DuplicateEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
      return Err(AuthError::WeakPassword);
    }

    let username = match username.trim() {
      "" => local_part(email),
      name => name,
    };
    let user = User {
      id:       Uuid::new_v4().to_string(),
      email:    email.to_owned(),
      username: username.to_owned(),
    };
    items.push(serde_json::to_value(StoredUser {
      user:          user.clone(),
      password_hash: password_digest(password),
    })?);

    let bytes = serde_json::to_vec(&items)?;
    self
      .store
      .set(keys::USERS, bytes)
      .await
      .map_err(AuthError::store)?;

    tracing::info!(user_id = %user.id, "registered user");
    self.persist_session(user).await
  }

  /// Sign in an existing user by email and password.
  pub async fn sign_in(
    &mut self,
    email: &str,
    password: &str,
  ) -> Result<User, AuthError> {
    let users = self.load_users().await?;
    let stored = users
      .into_iter()
      .find(|u| u.has_email(email))
      .ok_or(AuthError::UserNotFound)?;

    if password_digest(password) != stored.password_hash {
      return Err(AuthError::WrongPassword);
    }

    tracing::info!(user_id = %stored.user.id, "signed in");
    self.persist_session(stored.user).await
  }

  /// Clear the session. Signing out twice is the same as signing out once.
  pub async fn sign_out(&mut self) -> Result<(), AuthError> {
    self
      .store
      .remove(keys::SESSION)
      .await
      .map_err(AuthError::store)?;
    if let Some(user) = self.session.user.take() {
      tracing::info!(user_id = %user.id, "signed out");
    }
    Ok(())
  }

  /// Pick up the persisted session, if any.
  ///
  /// A session id that matches no registered user yields `None`; the stale
  /// pointer is left in the store.
  pub async fn restore_session(&mut self) -> Result<Option<User>, AuthError> {
    let raw = self
      .store
      .get(keys::SESSION)
      .await
      .map_err(AuthError::store)?;
    let Some(id) = raw.as_deref().and_then(decode_session) else {
      self.session.user = None;
      return Ok(None);
    };

    let found = self
      .load_users()
      .await?
      .into_iter()
      .find(|u| u.user.id == id)
      .map(|u| u.user);
    if found.is_none() {
      tracing::debug!(session_id = %id, "session refers to an unknown user");
    }

    self.session.user = found.clone();
    Ok(found)
  }
}
