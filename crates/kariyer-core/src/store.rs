//! The `RecordStore` trait — an opaque key → bytes persistence layer.
//!
//! The trait is implemented by storage backends (e.g. `kariyer-store-sqlite`
//! and [`MemoryStore`] below). The repository and session manager depend on
//! this abstraction only. No atomicity is promised across keys.

use std::{collections::HashMap, convert::Infallible, future::Future, sync::Mutex};

// ─── Keys ────────────────────────────────────────────────────────────────────

/// Well-known keys. Each holds an independent blob.
pub mod keys {
  /// JSON array of experiences, newest first.
  pub const EXPERIENCES: &str = "experiences_v1";
  /// JSON array of stored users.
  pub const USERS: &str = "auth_users_v1";
  /// The signed-in user's id as raw UTF-8; absent when signed out.
  pub const SESSION: &str = "auth_session_v1";
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a key-value byte store.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded tokio runtime.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the blob under `key`. Returns `None` if the key is unset.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send + 'a;

  /// Write `value` under `key`, replacing any previous blob.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: Vec<u8>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete `key`. Removing an unset key is not an error.
  fn remove<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── MemoryStore ─────────────────────────────────────────────────────────────

/// A process-local store backed by a `HashMap`. Nothing survives the
/// process; useful for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
    // A poisoned map is still a valid map; keep serving it.
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl RecordStore for MemoryStore {
  type Error = Infallible;

  async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Infallible> {
    Ok(self.entries().get(key).cloned())
  }

  async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), Infallible> {
    self.entries().insert(key.to_owned(), value);
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<(), Infallible> {
    self.entries().remove(key);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn set_get_remove() {
    let store = MemoryStore::new();
    assert_eq!(store.get("k").await.unwrap(), None);

    store.set("k", b"one".to_vec()).await.unwrap();
    store.set("k", b"two".to_vec()).await.unwrap();
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some(&b"two"[..]));

    store.remove("k").await.unwrap();
    store.remove("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
  }
}
