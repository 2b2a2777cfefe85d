//! The two store traits and their supporting query types.
//!
//! The reference authority store owns workflow state; the content store is a
//! pure document repository with no workflow knowledge. Both are implemented
//! by `merit-store-sqlite` and by the in-memory fakes in [`crate::memory`].
//! There is no transaction spanning the two; the coordinator sequences
//! writes so the orphan/pointer relationship stays reconcilable.

use std::future::Future;

use uuid::Uuid;

use crate::{
  content::{AchievementContent, ContentId, NewContent},
  reference::{AchievementReference, ReferenceUpdate, Status},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Which statuses a listing includes.
///
/// Soft-deleted records are excluded unless explicitly requested via
/// `Only(Status::Deleted)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
  /// Every status except deleted.
  #[default]
  Default,
  /// Exactly one status.
  Only(Status),
}

/// The ownership scope a listing is restricted to. Resolved by the policy
/// engine before the store is consulted; the store itself knows nothing
/// about roles or mentorship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerScope {
  All,
  Student(Uuid),
  /// An explicit advisee set, resolved through the directory.
  Students(Vec<Uuid>),
}

/// 1-based pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
  pub page:  usize,
  pub limit: usize,
}

impl Page {
  pub const DEFAULT_LIMIT: usize = 10;
  pub const MAX_LIMIT: usize = 100;

  /// Clamp to sane bounds: page >= 1, 1 <= limit <= 100.
  pub fn clamped(self) -> Self {
    let page = self.page.max(1);
    let limit = if self.limit < 1 || self.limit > Self::MAX_LIMIT {
      Self::DEFAULT_LIMIT
    } else {
      self.limit
    };
    Self { page, limit }
  }

  pub fn offset(self) -> usize {
    let p = self.clamped();
    (p.page - 1) * p.limit
  }
}

impl Default for Page {
  fn default() -> Self { Self { page: 1, limit: Self::DEFAULT_LIMIT } }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone)]
pub struct PageOf<T> {
  pub items: Vec<T>,
  pub page:  usize,
  pub limit: usize,
  pub total: usize,
}

impl<T> PageOf<T> {
  pub fn total_pages(&self) -> usize { self.total.div_ceil(self.limit.max(1)) }

  /// Map the items while keeping the pagination envelope.
  pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageOf<U> {
    PageOf {
      items: self.items.into_iter().map(f).collect(),
      page:  self.page,
      limit: self.limit,
      total: self.total,
    }
  }
}

/// Parameters for [`ReferenceStore::list`].
#[derive(Debug, Clone)]
pub struct ListFilter {
  pub status: StatusFilter,
  pub owner:  OwnerScope,
  pub page:   Page,
}

// ─── Reference authority store ───────────────────────────────────────────────

/// The store owning the canonical workflow record per achievement.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (tokio with `axum`).
pub trait ReferenceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new reference. Fails if the id already exists; backends
  /// signal that with a dedicated duplicate-id error variant.
  fn create<'a>(
    &'a self,
    reference: &'a AchievementReference,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Fetch a reference by id. Returns `None` if absent.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<AchievementReference>, Self::Error>> + Send + '_;

  /// Apply `update` only if the persisted status equals `expected`.
  ///
  /// Returns the updated record, or `None` when zero rows matched — the
  /// caller must treat `None` as a lost race (Conflict), never a no-op.
  fn conditional_update(
    &self,
    id: Uuid,
    expected: Status,
    update: ReferenceUpdate,
  ) -> impl Future<Output = Result<Option<AchievementReference>, Self::Error>> + Send + '_;

  /// List references matching `filter`, newest first, with a total count.
  fn list<'a>(
    &'a self,
    filter: &'a ListFilter,
  ) -> impl Future<Output = Result<PageOf<AchievementReference>, Self::Error>> + Send + 'a;
}

// ─── Content store ───────────────────────────────────────────────────────────

/// A pure content repository. No workflow knowledge lives here; the draft
/// guard on mutation is enforced by the coordinator against the reference.
pub trait ContentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist new content, assigning the content id and timestamps.
  fn create(
    &self,
    input: NewContent,
  ) -> impl Future<Output = Result<AchievementContent, Self::Error>> + Send + '_;

  /// Fetch a content record. Returns `None` if absent.
  fn get<'a>(
    &'a self,
    id: &'a ContentId,
  ) -> impl Future<Output = Result<Option<AchievementContent>, Self::Error>> + Send + 'a;

  /// Replace the mutable fields of an existing record.
  fn update<'a>(
    &'a self,
    id: &'a ContentId,
    content: &'a AchievementContent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove a record entirely. Used by the create compensation path.
  fn delete<'a>(
    &'a self,
    id: &'a ContentId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
