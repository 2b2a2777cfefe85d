//! [`DiskFileStore`] — attachment bytes on the local filesystem.
//!
//! Files land under a single root directory as `<uuid>_<sanitized-name>`,
//! so an uploaded name can never traverse out of the root or collide with
//! an earlier upload.

use std::path::PathBuf;

use chrono::Utc;
use merit_core::{
  content::Attachment,
  files::{FileMetadata, FileStore},
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FileError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

pub struct DiskFileStore {
  root:     PathBuf,
  /// Prefix for the URLs written into attachment descriptors, e.g.
  /// `/files` or a CDN origin.
  base_url: String,
}

impl DiskFileStore {
  /// Create the root directory if needed and return the store.
  pub async fn open(
    root: impl Into<PathBuf>,
    base_url: impl Into<String>,
  ) -> Result<Self, FileError> {
    let root = root.into();
    tokio::fs::create_dir_all(&root).await?;
    Ok(Self { root, base_url: base_url.into() })
  }
}

impl FileStore for DiskFileStore {
  type Error = FileError;

  async fn store(&self, bytes: Vec<u8>, meta: FileMetadata) -> Result<Attachment, FileError> {
    let id = Uuid::new_v4();
    let file_name = sanitize_file_name(&meta.file_name);
    let stored_name = format!("{}_{file_name}", id.simple());

    tokio::fs::write(self.root.join(&stored_name), &bytes).await?;

    Ok(Attachment {
      id,
      url: format!("{}/{stored_name}", self.base_url.trim_end_matches('/')),
      file_name,
      mime: meta.mime,
      size: bytes.len() as u64,
      uploaded_at: Utc::now(),
    })
  }
}

/// Reduce an uploaded name to `[A-Za-z0-9._-]`, with no leading dots and no
/// path separators.
fn sanitize_file_name(name: &str) -> String {
  let cleaned: String = name
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
        c
      } else {
        '_'
      }
    })
    .collect();

  // Replacing separators turns "../" prefixes into "_.._" noise; drop the
  // leading dot and underscore runs so "../../etc/passwd" reduces to
  // "etc_passwd".
  let trimmed = cleaned.trim_start_matches(['.', '_']);
  if trimmed.is_empty() {
    "attachment".to_owned()
  } else {
    trimmed.to_owned()
  }
}
