//! Achievement content — the rich, type-variant side of a record.
//!
//! Content lives in the document store and is mutable only while the owning
//! reference is in draft. The variant shape of [`AchievementDetails`] is
//! keyed by the achievement kind, which makes a kind/details mismatch
//! unrepresentable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Content id ──────────────────────────────────────────────────────────────

/// An opaque, store-assigned content identifier.
///
/// Persisted inside the owning reference as a pointer; never exposed to
/// external callers as a primary handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl std::fmt::Display for ContentId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Kind and details ────────────────────────────────────────────────────────

/// The closed enumeration of achievement categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementKind {
  Academic,
  Competition,
  Organization,
  Publication,
  Certification,
  Other,
}

impl AchievementKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Academic => "academic",
      Self::Competition => "competition",
      Self::Organization => "organization",
      Self::Publication => "publication",
      Self::Certification => "certification",
      Self::Other => "other",
    }
  }
}

impl std::fmt::Display for AchievementKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A date range, e.g. an organizational tenure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
  pub start: DateTime<Utc>,
  pub end:   Option<DateTime<Utc>>,
}

/// The typed payload of an achievement. The variant tag doubles as the
/// achievement kind on the wire and in the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AchievementDetails {
  Academic {
    score:      Option<i64>,
    event_date: Option<DateTime<Utc>>,
    organizer:  Option<String>,
  },
  Competition {
    competition_name:  String,
    competition_level: Option<String>,
    rank:              Option<u32>,
    medal:             Option<String>,
    event_date:        Option<DateTime<Utc>>,
    location:          Option<String>,
  },
  Organization {
    organization_name: String,
    position:          String,
    period:            Option<Period>,
  },
  Publication {
    publication_type:  Option<String>,
    publication_title: String,
    #[serde(default)]
    authors:           Vec<String>,
    publisher:         Option<String>,
    issn:              Option<String>,
  },
  Certification {
    certification_name:   String,
    issued_by:            Option<String>,
    certification_number: Option<String>,
    valid_until:          Option<DateTime<Utc>>,
  },
  /// Escape hatch for achievements that don't fit the taxonomy.
  Other {
    #[serde(default)]
    custom_fields: serde_json::Map<String, serde_json::Value>,
  },
}

impl AchievementDetails {
  /// The kind implied by the variant shape.
  pub fn kind(&self) -> AchievementKind {
    match self {
      Self::Academic { .. } => AchievementKind::Academic,
      Self::Competition { .. } => AchievementKind::Competition,
      Self::Organization { .. } => AchievementKind::Organization,
      Self::Publication { .. } => AchievementKind::Publication,
      Self::Certification { .. } => AchievementKind::Certification,
      Self::Other { .. } => AchievementKind::Other,
    }
  }
}

// ─── Attachments ─────────────────────────────────────────────────────────────

/// A file descriptor returned by the file-storage collaborator.
/// Only the descriptor is persisted; raw bytes never enter the stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
  pub id:          Uuid,
  pub file_name:   String,
  pub url:         String,
  pub mime:        String,
  pub size:        u64,
  pub uploaded_at: DateTime<Utc>,
}

// ─── Content record ──────────────────────────────────────────────────────────

/// The full content document for one achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementContent {
  pub content_id:  ContentId,
  /// Denormalized owner; must match the referencing record's student id.
  pub student_id:  Uuid,
  pub title:       String,
  pub description: String,
  pub details:     AchievementDetails,
  pub attachments: Vec<Attachment>,
  pub tags:        Vec<String>,
  pub points:      u32,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

impl AchievementContent {
  pub fn kind(&self) -> AchievementKind { self.details.kind() }
}

/// Input to [`crate::store::ContentStore::create`]. The content id and
/// timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewContent {
  pub student_id:  Uuid,
  pub title:       String,
  pub description: String,
  pub details:     AchievementDetails,
  pub attachments: Vec<Attachment>,
  pub tags:        Vec<String>,
  pub points:      u32,
}

// ─── Partial update ──────────────────────────────────────────────────────────

/// An explicit optional-field update, validated once at the boundary.
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentPatch {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub details:     Option<AchievementDetails>,
  pub tags:        Option<Vec<String>>,
  pub points:      Option<u32>,
}

impl ContentPatch {
  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.description.is_none()
      && self.details.is_none()
      && self.tags.is_none()
      && self.points.is_none()
  }

  /// Apply the supplied fields to `content`, leaving the rest untouched.
  /// Does not touch timestamps; the caller owns `updated_at`.
  pub fn apply(&self, content: &mut AchievementContent) {
    if let Some(title) = &self.title {
      content.title = title.clone();
    }
    if let Some(description) = &self.description {
      content.description = description.clone();
    }
    if let Some(details) = &self.details {
      content.details = details.clone();
    }
    if let Some(tags) = &self.tags {
      content.tags = tags.clone();
    }
    if let Some(points) = self.points {
      content.points = points;
    }
  }
}
