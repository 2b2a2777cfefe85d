//! Error type for `merit-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum column held a value no variant maps to.
  #[error("unrecognized stored value: {0}")]
  Decode(String),

  /// Attempted to create a reference whose id (or content pointer) already
  /// exists.
  #[error("reference {0} already exists")]
  DuplicateReference(uuid::Uuid),

  /// Attempted to update content that is not stored.
  #[error("content not found: {0}")]
  ContentNotFound(merit_core::content::ContentId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
