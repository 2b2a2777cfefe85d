//! The file-storage collaborator contract.
//!
//! The backend that actually holds bytes is external; the core persists only
//! the returned [`Attachment`] descriptor inside the content document.

use std::future::Future;

use crate::content::Attachment;

/// Caller-supplied metadata for a stored file.
#[derive(Debug, Clone)]
pub struct FileMetadata {
  pub file_name: String,
  pub mime:      String,
}

pub trait FileStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Store `bytes` and return the descriptor to persist.
  fn store(
    &self,
    bytes: Vec<u8>,
    meta: FileMetadata,
  ) -> impl Future<Output = Result<Attachment, Self::Error>> + Send + '_;
}
