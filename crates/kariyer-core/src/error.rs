//! Error types for `kariyer-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A user-supplied value was rejected; the message is user-displayable.
  #[error("{0}")]
  Validation(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error from a [`RecordStore`](crate::store::RecordStore).
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
