//! [`Coordinator`] — the consistency coordinator for the two backing stores.
//!
//! No transaction spans the reference authority store and the content store.
//! The coordinator sequences every multi-store operation in a fixed order
//! (content before reference on create, reference before content on read),
//! linearizes transitions through conditional writes keyed on the expected
//! prior status, and compensates the one partial-write case the ordering
//! leaves possible: content written but the reference write failed.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use merit_core::{
  Error, Result,
  actor::Actor,
  content::{
    AchievementContent, AchievementDetails, AchievementKind, Attachment, ContentPatch,
    NewContent,
  },
  directory::Directory,
  files::{FileMetadata, FileStore},
  reference::{AchievementReference, ReferenceUpdate, Status},
  store::{ContentStore, ListFilter, Page, PageOf, ReferenceStore, StatusFilter},
};

use crate::policy::AccessPolicy;

// ─── Inputs and outputs ──────────────────────────────────────────────────────

/// Input to [`Coordinator::create`].
#[derive(Debug, Clone)]
pub struct NewAchievement {
  /// Target student when an admin creates on behalf; ignored for students
  /// creating their own (and rejected if it names someone else).
  pub student_id:  Option<Uuid>,
  pub title:       String,
  pub description: String,
  pub details:     AchievementDetails,
  /// Descriptors of files already stored through the file collaborator.
  pub attachments: Vec<Attachment>,
  pub tags:        Vec<String>,
  pub points:      u32,
}

/// A reference joined with the content it points to.
#[derive(Debug, Clone)]
pub struct AchievementRecord {
  pub reference: AchievementReference,
  pub content:   AchievementContent,
}

/// The listing projection: workflow fields plus the content headline.
#[derive(Debug, Clone, Serialize)]
pub struct AchievementSummary {
  pub id:           Uuid,
  pub student_id:   Uuid,
  pub status:       Status,
  pub kind:         AchievementKind,
  pub title:        String,
  pub points:       u32,
  pub submitted_at: Option<DateTime<Utc>>,
  pub verified_at:  Option<DateTime<Utc>>,
  pub created_at:   DateTime<Utc>,
}

/// One entry of the status timeline, derived from reference timestamps.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEvent {
  pub status: Status,
  pub at:     DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub actor:  Option<Uuid>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub note:   Option<String>,
}

// ─── Coordinator ─────────────────────────────────────────────────────────────

/// How long the orphan-cleanup compensation may run. Independent of the
/// caller's deadline: cancelling the original request must not abort the
/// cleanup of a half-finished create.
const DEFAULT_CLEANUP_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Coordinator<R, C, D, F> {
  references:      Arc<R>,
  content:         Arc<C>,
  policy:          AccessPolicy<D>,
  files:           Arc<F>,
  cleanup_timeout: Duration,
}

impl<R, C, D, F> Coordinator<R, C, D, F>
where
  R: ReferenceStore,
  C: ContentStore + 'static,
  D: Directory,
  F: FileStore,
{
  pub fn new(references: Arc<R>, content: Arc<C>, directory: Arc<D>, files: Arc<F>) -> Self {
    Self {
      references,
      content,
      policy: AccessPolicy::new(directory),
      files,
      cleanup_timeout: DEFAULT_CLEANUP_TIMEOUT,
    }
  }

  pub fn with_cleanup_timeout(mut self, timeout: Duration) -> Self {
    self.cleanup_timeout = timeout;
    self
  }

  pub fn policy(&self) -> &AccessPolicy<D> { &self.policy }

  // ── Create ────────────────────────────────────────────────────────────────

  /// The two-step create protocol: content first, then the reference
  /// pointing at it. A reference write failure triggers best-effort
  /// deletion of the orphaned content on a detached task.
  pub async fn create(&self, actor: &Actor, input: NewAchievement) -> Result<AchievementRecord> {
    if input.title.trim().is_empty() {
      return Err(Error::Validation("title must not be empty".into()));
    }

    let student_id = self
      .policy
      .resolve_create_target(actor, input.student_id)
      .await?;

    let content = self
      .content
      .create(NewContent {
        student_id,
        title: input.title,
        description: input.description,
        details: input.details,
        attachments: input.attachments,
        tags: input.tags,
        points: input.points,
      })
      .await
      .map_err(Error::store)?;

    let reference = AchievementReference::draft(student_id, content.content_id.clone());

    if let Err(create_err) = self.references.create(&reference).await {
      self.rollback_orphaned_content(content.content_id.clone()).await;
      return Err(Error::store(create_err));
    }

    tracing::info!(
      reference_id = %reference.id,
      student_id = %student_id,
      kind = %content.kind(),
      "achievement created",
    );
    Ok(AchievementRecord { reference, content })
  }

  /// Delete content left orphaned by a failed reference write.
  ///
  /// Runs on a detached task under its own deadline so the caller
  /// abandoning the original request cannot abort it. Failure is logged
  /// for manual reconciliation, never retried here.
  async fn rollback_orphaned_content(&self, orphan: merit_core::content::ContentId) {
    let store = Arc::clone(&self.content);
    let deadline = self.cleanup_timeout;

    let cleanup = tokio::spawn(async move {
      match tokio::time::timeout(deadline, store.delete(&orphan)).await {
        Ok(Ok(())) => {
          tracing::warn!(
            content_id = %orphan,
            "rolled back orphaned content after reference write failure",
          );
        }
        Ok(Err(err)) => {
          tracing::error!(
            content_id = %orphan,
            error = %err,
            "orphan content rollback failed; manual reconciliation required",
          );
        }
        Err(_) => {
          tracing::error!(
            content_id = %orphan,
            "orphan content rollback timed out; manual reconciliation required",
          );
        }
      }
    });

    // Await completion on the happy path; if this await is cancelled the
    // spawned task still runs to the deadline.
    let _ = cleanup.await;
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Read protocol: reference first (authoritative for status and access),
  /// then content by the stored pointer.
  pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<AchievementRecord> {
    let reference = self.require_reference(id).await?;
    self.policy.authorize_view(actor, &reference).await?;
    let content = self.require_content(&reference).await?;
    Ok(AchievementRecord { reference, content })
  }

  /// Role-scoped listing. A reference whose content is missing is logged
  /// and skipped rather than failing the whole page.
  pub async fn list(
    &self,
    actor: &Actor,
    status: StatusFilter,
    page: Page,
  ) -> Result<PageOf<AchievementSummary>> {
    let owner = self.policy.list_scope(actor).await?;
    let filter = ListFilter { status, owner, page };
    let refs = self.references.list(&filter).await.map_err(Error::store)?;

    let mut items = Vec::with_capacity(refs.items.len());
    for reference in &refs.items {
      match self.content.get(&reference.content_id).await.map_err(Error::store)? {
        Some(content) => items.push(AchievementSummary {
          id:           reference.id,
          student_id:   reference.student_id,
          status:       reference.status,
          kind:         content.kind(),
          title:        content.title,
          points:       content.points,
          submitted_at: reference.submitted_at,
          verified_at:  reference.verified_at,
          created_at:   reference.created_at,
        }),
        None => {
          tracing::warn!(
            reference_id = %reference.id,
            content_id = %reference.content_id,
            "skipping reference with missing content in listing",
          );
        }
      }
    }

    Ok(PageOf { items, page: refs.page, limit: refs.limit, total: refs.total })
  }

  /// The status timeline for one record.
  pub async fn history(&self, actor: &Actor, id: Uuid) -> Result<Vec<HistoryEvent>> {
    let reference = self.require_reference(id).await?;
    self.policy.authorize_view(actor, &reference).await?;

    let mut events = vec![HistoryEvent {
      status: Status::Draft,
      at:     reference.created_at,
      actor:  None,
      note:   None,
    }];
    if let Some(at) = reference.submitted_at {
      events.push(HistoryEvent { status: Status::Submitted, at, actor: None, note: None });
    }
    if let Some(at) = reference.verified_at {
      events.push(HistoryEvent {
        status: Status::Verified,
        at,
        actor: reference.verified_by,
        note: None,
      });
    }
    if reference.status == Status::Rejected {
      events.push(HistoryEvent {
        status: Status::Rejected,
        at:     reference.updated_at,
        actor:  None,
        note:   reference.rejection_note.clone(),
      });
    }
    if reference.status == Status::Deleted {
      events.push(HistoryEvent {
        status: Status::Deleted,
        at:     reference.updated_at,
        actor:  None,
        note:   None,
      });
    }
    Ok(events)
  }

  // ── Content mutation ──────────────────────────────────────────────────────

  /// Partial content update; permitted only while the reference is draft.
  pub async fn update(
    &self,
    actor: &Actor,
    id: Uuid,
    patch: ContentPatch,
  ) -> Result<AchievementRecord> {
    if patch.is_empty() {
      return Err(Error::Validation("update must supply at least one field".into()));
    }
    if let Some(title) = &patch.title
      && title.trim().is_empty()
    {
      return Err(Error::Validation("title must not be empty".into()));
    }

    let reference = self.require_reference(id).await?;
    self.policy.authorize_mutation(actor, &reference).await?;
    guard(&reference, Status::Draft)?;

    let mut content = self.require_content(&reference).await?;
    patch.apply(&mut content);
    content.updated_at = Utc::now();

    self
      .content
      .update(&reference.content_id, &content)
      .await
      .map_err(Error::store)?;

    Ok(AchievementRecord { reference, content })
  }

  /// Store a file through the file collaborator and append its descriptor
  /// to the content document. Draft-only, like any content mutation.
  pub async fn attach(
    &self,
    actor: &Actor,
    id: Uuid,
    bytes: Vec<u8>,
    meta: FileMetadata,
  ) -> Result<Attachment> {
    if meta.file_name.trim().is_empty() {
      return Err(Error::Validation("file_name must not be empty".into()));
    }
    if bytes.is_empty() {
      return Err(Error::Validation("attachment body must not be empty".into()));
    }

    let reference = self.require_reference(id).await?;
    self.policy.authorize_mutation(actor, &reference).await?;
    guard(&reference, Status::Draft)?;

    let attachment = self.files.store(bytes, meta).await.map_err(Error::store)?;

    let mut content = self.require_content(&reference).await?;
    content.attachments.push(attachment.clone());
    content.updated_at = Utc::now();

    self
      .content
      .update(&reference.content_id, &content)
      .await
      .map_err(Error::store)?;

    Ok(attachment)
  }

  // ── Transitions ───────────────────────────────────────────────────────────

  /// draft → submitted, by the owning student or an admin.
  pub async fn submit(&self, actor: &Actor, id: Uuid) -> Result<AchievementReference> {
    let reference = self.require_reference(id).await?;
    self.policy.authorize_mutation(actor, &reference).await?;
    guard(&reference, Status::Draft)?;

    self
      .transition(id, Status::Draft, ReferenceUpdate::submit(Utc::now()))
      .await
  }

  /// submitted → verified, by an admin or the owning student's advisor.
  pub async fn verify(&self, actor: &Actor, id: Uuid) -> Result<AchievementReference> {
    let reference = self.require_reference(id).await?;
    self.policy.authorize_review(actor, &reference).await?;
    guard(&reference, Status::Submitted)?;

    self
      .transition(
        id,
        Status::Submitted,
        ReferenceUpdate::verify(actor.user_id, Utc::now()),
      )
      .await
  }

  /// submitted → rejected. The note is required and validated before any
  /// store write is attempted.
  pub async fn reject(
    &self,
    actor: &Actor,
    id: Uuid,
    note: String,
  ) -> Result<AchievementReference> {
    let note = note.trim().to_owned();
    if note.is_empty() {
      return Err(Error::Validation("rejection_note must not be empty".into()));
    }

    let reference = self.require_reference(id).await?;
    self.policy.authorize_review(actor, &reference).await?;
    guard(&reference, Status::Submitted)?;

    self
      .transition(id, Status::Submitted, ReferenceUpdate::reject(note))
      .await
  }

  /// draft → deleted (tombstone). Content is left in place; the reference
  /// alone decides visibility.
  pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<AchievementReference> {
    let reference = self.require_reference(id).await?;
    self.policy.authorize_mutation(actor, &reference).await?;
    guard(&reference, Status::Draft)?;

    self
      .transition(id, Status::Draft, ReferenceUpdate::soft_delete())
      .await
  }

  /// Issue the conditional write; zero rows affected means a concurrent
  /// request moved the state first, reported as Conflict with the status
  /// observed on re-read.
  async fn transition(
    &self,
    id: Uuid,
    expected: Status,
    update: ReferenceUpdate,
  ) -> Result<AchievementReference> {
    let target = update.status;
    match self
      .references
      .conditional_update(id, expected, update)
      .await
      .map_err(Error::store)?
    {
      Some(updated) => {
        tracing::info!(reference_id = %id, from = %expected, to = %target, "transition applied");
        Ok(updated)
      }
      None => {
        let current = self
          .references
          .get(id)
          .await
          .map_err(Error::store)?
          .map(|r| r.status);
        Err(Error::Conflict { current })
      }
    }
  }

  // ── Lookup helpers ────────────────────────────────────────────────────────

  async fn require_reference(&self, id: Uuid) -> Result<AchievementReference> {
    self
      .references
      .get(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(id))
  }

  /// Content absent while the reference exists is store corruption, not a
  /// normal miss.
  async fn require_content(&self, reference: &AchievementReference) -> Result<AchievementContent> {
    self
      .content
      .get(&reference.content_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| {
        Error::DataIntegrity(format!(
          "reference {} points to missing content {}",
          reference.id, reference.content_id,
        ))
      })
  }
}

/// Status guard shared by every mutation and transition path.
fn guard(reference: &AchievementReference, required: Status) -> Result<()> {
  if reference.status == required {
    Ok(())
  } else {
    Err(Error::InvalidTransition { current: reference.status, required })
  }
}
