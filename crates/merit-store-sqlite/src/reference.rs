//! [`SqliteReferenceStore`] — the SQLite implementation of the reference
//! authority store.
//!
//! Transitions go through a single conditional `UPDATE ... WHERE id = ? AND
//! status = ?`; SQLite's serialized writes make that check-and-set atomic, so
//! two racing transitions can never both match.

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use merit_core::{
  reference::{AchievementReference, ReferenceUpdate, Status},
  store::{ListFilter, OwnerScope, PageOf, ReferenceStore, StatusFilter},
};

use crate::{
  Error, Result,
  encode::{REFERENCE_COLUMNS, encode_dt, encode_status, encode_uuid, reference_row},
  schema::REFERENCE_SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Reference authority store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteReferenceStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteReferenceStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
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
        conn.execute_batch(REFERENCE_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Translate the WHERE fragment of a [`ListFilter`] into SQL conditions and
/// positional parameters. The owner scope must be non-empty; the caller
/// short-circuits an empty advisee set.
fn list_conditions(filter: &ListFilter) -> (Vec<String>, Vec<rusqlite::types::Value>) {
  let mut conds: Vec<String> = vec![];
  let mut params: Vec<rusqlite::types::Value> = vec![];

  match filter.status {
    StatusFilter::Default => conds.push("status != 'deleted'".into()),
    StatusFilter::Only(status) => {
      conds.push("status = ?".into());
      params.push(encode_status(status).to_owned().into());
    }
  }

  match &filter.owner {
    OwnerScope::All => {}
    OwnerScope::Student(id) => {
      conds.push("student_id = ?".into());
      params.push(encode_uuid(*id).into());
    }
    OwnerScope::Students(ids) => {
      let placeholders = vec!["?"; ids.len()].join(", ");
      conds.push(format!("student_id IN ({placeholders})"));
      params.extend(ids.iter().map(|id| encode_uuid(*id).into()));
    }
  }

  (conds, params)
}

// ─── ReferenceStore impl ─────────────────────────────────────────────────────

impl ReferenceStore for SqliteReferenceStore {
  type Error = Error;

  async fn create(&self, reference: &AchievementReference) -> Result<()> {
    let id_str         = encode_uuid(reference.id);
    let student_str    = encode_uuid(reference.student_id);
    let content_str    = reference.content_id.as_str().to_owned();
    let status_str     = encode_status(reference.status).to_owned();
    let submitted_str  = reference.submitted_at.map(encode_dt);
    let verified_str   = reference.verified_at.map(encode_dt);
    let verifier_str   = reference.verified_by.map(encode_uuid);
    let note           = reference.rejection_note.clone();
    let created_str    = encode_dt(reference.created_at);
    let updated_str    = encode_dt(reference.updated_at);

    let inserted = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO achievement_references (
             id, student_id, content_id, status,
             submitted_at, verified_at, verified_by, rejection_note,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            student_str,
            content_str,
            status_str,
            submitted_str,
            verified_str,
            verifier_str,
            note,
            created_str,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await;

    match inserted {
      Ok(()) => Ok(()),
      Err(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _)))
        if e.code == rusqlite::ErrorCode::ConstraintViolation =>
      {
        Err(Error::DuplicateReference(reference.id))
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn get(&self, id: Uuid) -> Result<Option<AchievementReference>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {REFERENCE_COLUMNS} FROM achievement_references WHERE id = ?1"
              ),
              rusqlite::params![id_str],
              reference_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(|r| r.into_reference()).transpose()
  }

  async fn conditional_update(
    &self,
    id: Uuid,
    expected: Status,
    update: ReferenceUpdate,
  ) -> Result<Option<AchievementReference>> {
    let id_str        = encode_uuid(id);
    let expected_str  = encode_status(expected).to_owned();
    let status_str    = encode_status(update.status).to_owned();
    let submitted_str = update.submitted_at.map(encode_dt);
    let verified_str  = update.verified_at.map(encode_dt);
    let verifier_str  = update.verified_by.map(encode_uuid);
    let note          = update.rejection_note;
    let updated_str   = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        // The status predicate makes this a check-and-set; zero rows
        // changed means the expected status no longer holds.
        let changed = conn.execute(
          "UPDATE achievement_references
           SET status         = ?2,
               submitted_at   = COALESCE(?3, submitted_at),
               verified_at    = COALESCE(?4, verified_at),
               verified_by    = COALESCE(?5, verified_by),
               rejection_note = COALESCE(?6, rejection_note),
               updated_at     = ?7
           WHERE id = ?1 AND status = ?8",
          rusqlite::params![
            id_str,
            status_str,
            submitted_str,
            verified_str,
            verifier_str,
            note,
            updated_str,
            expected_str,
          ],
        )?;

        if changed == 0 {
          return Ok(None);
        }

        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {REFERENCE_COLUMNS} FROM achievement_references WHERE id = ?1"
              ),
              rusqlite::params![id_str],
              reference_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(|r| r.into_reference()).transpose()
  }

  async fn list(&self, filter: &ListFilter) -> Result<PageOf<AchievementReference>> {
    let page = filter.page.clamped();

    // An advisor with no advisees matches nothing; skip the round-trip.
    if matches!(&filter.owner, OwnerScope::Students(ids) if ids.is_empty()) {
      return Ok(PageOf { items: vec![], page: page.page, limit: page.limit, total: 0 });
    }

    let (conds, params) = list_conditions(filter);
    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    let limit = page.limit as i64;
    let offset = filter.page.offset() as i64;

    let (raws, total) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM achievement_references {where_clause}"),
          rusqlite::params_from_iter(params.iter()),
          |row| row.get(0),
        )?;

        let mut page_params = params;
        page_params.push(limit.into());
        page_params.push(offset.into());

        let mut stmt = conn.prepare(&format!(
          "SELECT {REFERENCE_COLUMNS} FROM achievement_references
           {where_clause}
           ORDER BY created_at DESC
           LIMIT ? OFFSET ?"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(page_params.iter()), reference_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(|r| r.into_reference())
      .collect::<Result<_>>()?;

    Ok(PageOf { items, page: page.page, limit: page.limit, total: total as usize })
  }
}
