//! The achievement reference — the canonical workflow record.
//!
//! The reference authority store owns one of these per achievement. It is
//! the single source of truth for workflow state; the content store is never
//! consulted to infer status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::ContentId;

// ─── Status ──────────────────────────────────────────────────────────────────

/// The lifecycle state of an achievement.
///
/// Transitions: `draft → submitted → {verified, rejected}` and
/// `draft → deleted`. Verified, rejected and deleted are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  Draft,
  Submitted,
  Verified,
  Rejected,
  Deleted,
}

impl Status {
  /// The string stored in the `status` column and used on the wire.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Draft => "draft",
      Self::Submitted => "submitted",
      Self::Verified => "verified",
      Self::Rejected => "rejected",
      Self::Deleted => "deleted",
    }
  }

  /// The states reachable from `self` in one transition.
  pub fn successors(self) -> &'static [Status] {
    match self {
      Self::Draft => &[Self::Submitted, Self::Deleted],
      Self::Submitted => &[Self::Verified, Self::Rejected],
      // Terminal states; no outgoing transitions.
      Self::Verified | Self::Rejected | Self::Deleted => &[],
    }
  }

  pub fn can_transition_to(self, next: Status) -> bool {
    self.successors().contains(&next)
  }

  pub fn is_terminal(self) -> bool { self.successors().is_empty() }
}

impl std::fmt::Display for Status {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for Status {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "draft" => Ok(Self::Draft),
      "submitted" => Ok(Self::Submitted),
      "verified" => Ok(Self::Verified),
      "rejected" => Ok(Self::Rejected),
      "deleted" => Ok(Self::Deleted),
      other => Err(format!("unknown status: {other:?}")),
    }
  }
}

// ─── Reference ───────────────────────────────────────────────────────────────

/// The canonical workflow record for one achievement.
///
/// `id`, `student_id` and `content_id` are immutable after creation. The
/// remaining fields change only through conditional transition writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementReference {
  pub id:             Uuid,
  pub student_id:     Uuid,
  /// Pointer into the content store. Set once at creation, never changed,
  /// and never exposed to callers as a primary handle.
  pub content_id:     ContentId,
  pub status:         Status,
  pub submitted_at:   Option<DateTime<Utc>>,
  /// Set together with `verified_by`, only on transition to verified.
  pub verified_at:    Option<DateTime<Utc>>,
  pub verified_by:    Option<Uuid>,
  /// Non-empty if and only if the status is rejected.
  pub rejection_note: Option<String>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl AchievementReference {
  /// A fresh draft reference pointing at just-created content.
  pub fn draft(student_id: Uuid, content_id: ContentId) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      student_id,
      content_id,
      status: Status::Draft,
      submitted_at: None,
      verified_at: None,
      verified_by: None,
      rejection_note: None,
      created_at: now,
      updated_at: now,
    }
  }
}

// ─── Conditional update ──────────────────────────────────────────────────────

/// The field set applied by a conditional transition write.
///
/// `None` fields are left untouched by the store; the store always bumps
/// `updated_at`. Use the constructors rather than building this by hand so
/// the per-transition field invariants hold.
#[derive(Debug, Clone)]
pub struct ReferenceUpdate {
  pub status:         Status,
  pub submitted_at:   Option<DateTime<Utc>>,
  pub verified_at:    Option<DateTime<Utc>>,
  pub verified_by:    Option<Uuid>,
  pub rejection_note: Option<String>,
}

impl ReferenceUpdate {
  pub fn submit(at: DateTime<Utc>) -> Self {
    Self {
      status: Status::Submitted,
      submitted_at: Some(at),
      verified_at: None,
      verified_by: None,
      rejection_note: None,
    }
  }

  pub fn verify(by: Uuid, at: DateTime<Utc>) -> Self {
    Self {
      status: Status::Verified,
      submitted_at: None,
      verified_at: Some(at),
      verified_by: Some(by),
      rejection_note: None,
    }
  }

  /// `verified_at`/`verified_by` stay unset on rejection; they belong to
  /// the verified transition only.
  pub fn reject(note: String) -> Self {
    Self {
      status: Status::Rejected,
      submitted_at: None,
      verified_at: None,
      verified_by: None,
      rejection_note: Some(note),
    }
  }

  pub fn soft_delete() -> Self {
    Self {
      status: Status::Deleted,
      submitted_at: None,
      verified_at: None,
      verified_by: None,
      rejection_note: None,
    }
  }
}
