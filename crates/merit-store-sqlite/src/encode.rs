//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings, statuses and roles as their canonical lowercase names.

use chrono::{DateTime, Utc};
use merit_core::{
  actor::Role,
  content::ContentId,
  reference::{AchievementReference, Status},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Status ──────────────────────────────────────────────────────────────────

pub fn encode_status(s: Status) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<Status> {
  s.parse().map_err(Error::Decode)
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str { r.as_str() }

pub fn decode_role(s: &str) -> Result<Role> { s.parse().map_err(Error::Decode) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `achievement_references` row.
pub struct RawReference {
  pub id:             String,
  pub student_id:     String,
  pub content_id:     String,
  pub status:         String,
  pub submitted_at:   Option<String>,
  pub verified_at:    Option<String>,
  pub verified_by:    Option<String>,
  pub rejection_note: Option<String>,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawReference {
  pub fn into_reference(self) -> Result<AchievementReference> {
    Ok(AchievementReference {
      id:             decode_uuid(&self.id)?,
      student_id:     decode_uuid(&self.student_id)?,
      content_id:     ContentId::new(self.content_id),
      status:         decode_status(&self.status)?,
      submitted_at:   self.submitted_at.as_deref().map(decode_dt).transpose()?,
      verified_at:    self.verified_at.as_deref().map(decode_dt).transpose()?,
      verified_by:    self.verified_by.as_deref().map(decode_uuid).transpose()?,
      rejection_note: self.rejection_note,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

/// Map a reference row in SELECT column order. Shared by every read path so
/// the column list stays in one place.
pub fn reference_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawReference> {
  Ok(RawReference {
    id:             row.get(0)?,
    student_id:     row.get(1)?,
    content_id:     row.get(2)?,
    status:         row.get(3)?,
    submitted_at:   row.get(4)?,
    verified_at:    row.get(5)?,
    verified_by:    row.get(6)?,
    rejection_note: row.get(7)?,
    created_at:     row.get(8)?,
    updated_at:     row.get(9)?,
  })
}

/// The reference column list in the order [`reference_row`] expects.
pub const REFERENCE_COLUMNS: &str = "id, student_id, content_id, status, \
   submitted_at, verified_at, verified_by, rejection_note, created_at, \
   updated_at";
