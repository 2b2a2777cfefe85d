//! [`SqliteContentStore`] — the SQLite implementation of the content store.
//!
//! Content records are kept as whole JSON documents, one row per record,
//! which keeps the variant-shaped details payload schemaless the way a
//! document database would.

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use merit_core::{
  content::{AchievementContent, ContentId, NewContent},
  store::ContentStore,
};

use crate::{Error, Result, encode::encode_uuid, schema::CONTENT_SCHEMA};

/// Content store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteContentStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteContentStore {
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(CONTENT_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl ContentStore for SqliteContentStore {
  type Error = Error;

  async fn create(&self, input: NewContent) -> Result<AchievementContent> {
    // Store-assigned opaque id; compact so it reads as a pointer, not an
    // entity id.
    let content_id = ContentId::new(Uuid::new_v4().simple().to_string());
    let now = Utc::now();

    let content = AchievementContent {
      content_id:  content_id.clone(),
      student_id:  input.student_id,
      title:       input.title,
      description: input.description,
      details:     input.details,
      attachments: input.attachments,
      tags:        input.tags,
      points:      input.points,
      created_at:  now,
      updated_at:  now,
    };

    let id_str      = content_id.as_str().to_owned();
    let student_str = encode_uuid(content.student_id);
    let document    = serde_json::to_string(&content)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO achievement_content (content_id, student_id, document)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, student_str, document],
        )?;
        Ok(())
      })
      .await?;

    Ok(content)
  }

  async fn get(&self, id: &ContentId) -> Result<Option<AchievementContent>> {
    let id_str = id.as_str().to_owned();

    let document: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT document FROM achievement_content WHERE content_id = ?1",
              rusqlite::params![id_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    document
      .map(|d| serde_json::from_str(&d))
      .transpose()
      .map_err(Error::from)
  }

  async fn update(&self, id: &ContentId, content: &AchievementContent) -> Result<()> {
    let id_str   = id.as_str().to_owned();
    let document = serde_json::to_string(content)?;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE achievement_content SET document = ?2 WHERE content_id = ?1",
          rusqlite::params![id_str, document],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ContentNotFound(id.clone()));
    }
    Ok(())
  }

  /// Idempotent: deleting absent content succeeds, which keeps the create
  /// compensation path safe to re-run.
  async fn delete(&self, id: &ContentId) -> Result<()> {
    let id_str = id.as_str().to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM achievement_content WHERE content_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
