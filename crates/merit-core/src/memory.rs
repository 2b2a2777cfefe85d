//! In-memory implementations of every collaborator contract.
//!
//! These back the coordinator and API tests, and double as fault-injection
//! points: forced failures exercise the compensation paths that a healthy
//! backend never takes. Not intended for production use.

use std::{
  collections::HashMap,
  sync::{
    Mutex, MutexGuard,
    atomic::{AtomicBool, AtomicU64, Ordering},
  },
};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  actor::{Actor, Advisor, Role, Student},
  content::{AchievementContent, Attachment, ContentId, NewContent},
  directory::Directory,
  files::{FileMetadata, FileStore},
  reference::{AchievementReference, ReferenceUpdate, Status},
  store::{ContentStore, ListFilter, OwnerScope, PageOf, ReferenceStore, StatusFilter},
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("reference {0} already exists")]
  DuplicateReference(Uuid),

  #[error("injected fault: {0}")]
  Injected(&'static str),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().expect("memory store lock poisoned")
}

// ─── Reference store ─────────────────────────────────────────────────────────

/// In-memory [`ReferenceStore`] with single-record atomicity via a mutex.
#[derive(Default)]
pub struct MemoryReferenceStore {
  records:          Mutex<HashMap<Uuid, AchievementReference>>,
  fail_next_create: AtomicBool,
}

impl MemoryReferenceStore {
  pub fn new() -> Self { Self::default() }

  /// Make the next `create` call fail, to exercise the orphan-compensation
  /// path of the create protocol.
  pub fn fail_next_create(&self) {
    self.fail_next_create.store(true, Ordering::SeqCst);
  }
}

impl ReferenceStore for MemoryReferenceStore {
  type Error = MemoryError;

  async fn create(&self, reference: &AchievementReference) -> Result<(), MemoryError> {
    if self.fail_next_create.swap(false, Ordering::SeqCst) {
      return Err(MemoryError::Injected("reference create"));
    }

    let mut records = lock(&self.records);
    if records.contains_key(&reference.id) {
      return Err(MemoryError::DuplicateReference(reference.id));
    }
    records.insert(reference.id, reference.clone());
    Ok(())
  }

  async fn get(&self, id: Uuid) -> Result<Option<AchievementReference>, MemoryError> {
    Ok(lock(&self.records).get(&id).cloned())
  }

  async fn conditional_update(
    &self,
    id: Uuid,
    expected: Status,
    update: ReferenceUpdate,
  ) -> Result<Option<AchievementReference>, MemoryError> {
    let mut records = lock(&self.records);
    let Some(record) = records.get_mut(&id) else {
      return Ok(None);
    };
    if record.status != expected {
      return Ok(None);
    }

    record.status = update.status;
    if update.submitted_at.is_some() {
      record.submitted_at = update.submitted_at;
    }
    if update.verified_at.is_some() {
      record.verified_at = update.verified_at;
    }
    if update.verified_by.is_some() {
      record.verified_by = update.verified_by;
    }
    if update.rejection_note.is_some() {
      record.rejection_note = update.rejection_note;
    }
    record.updated_at = Utc::now();

    Ok(Some(record.clone()))
  }

  async fn list(
    &self,
    filter: &ListFilter,
  ) -> Result<PageOf<AchievementReference>, MemoryError> {
    let records = lock(&self.records);

    let mut matches: Vec<AchievementReference> = records
      .values()
      .filter(|r| match filter.status {
        StatusFilter::Default => r.status != Status::Deleted,
        StatusFilter::Only(status) => r.status == status,
      })
      .filter(|r| match &filter.owner {
        OwnerScope::All => true,
        OwnerScope::Student(id) => r.student_id == *id,
        OwnerScope::Students(ids) => ids.contains(&r.student_id),
      })
      .cloned()
      .collect();
    matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let page = filter.page.clamped();
    let total = matches.len();
    let items = matches
      .into_iter()
      .skip(filter.page.offset())
      .take(page.limit)
      .collect();

    Ok(PageOf { items, page: page.page, limit: page.limit, total })
  }
}

// ─── Content store ───────────────────────────────────────────────────────────

/// In-memory [`ContentStore`] assigning sequential opaque ids.
#[derive(Default)]
pub struct MemoryContentStore {
  documents:        Mutex<HashMap<ContentId, AchievementContent>>,
  next_id:          AtomicU64,
  fail_next_delete: AtomicBool,
}

impl MemoryContentStore {
  pub fn new() -> Self { Self::default() }

  /// Make the next `delete` call fail, to exercise the
  /// compensation-also-failed logging path.
  pub fn fail_next_delete(&self) {
    self.fail_next_delete.store(true, Ordering::SeqCst);
  }

  /// Number of documents currently held. Used by orphan-cleanup tests.
  pub fn len(&self) -> usize { lock(&self.documents).len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl ContentStore for MemoryContentStore {
  type Error = MemoryError;

  async fn create(&self, input: NewContent) -> Result<AchievementContent, MemoryError> {
    let seq = self.next_id.fetch_add(1, Ordering::SeqCst);
    let content_id = ContentId::new(format!("mem-{seq:08x}"));
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

    lock(&self.documents).insert(content_id, content.clone());
    Ok(content)
  }

  async fn get(&self, id: &ContentId) -> Result<Option<AchievementContent>, MemoryError> {
    Ok(lock(&self.documents).get(id).cloned())
  }

  async fn update(
    &self,
    id: &ContentId,
    content: &AchievementContent,
  ) -> Result<(), MemoryError> {
    lock(&self.documents).insert(id.clone(), content.clone());
    Ok(())
  }

  async fn delete(&self, id: &ContentId) -> Result<(), MemoryError> {
    if self.fail_next_delete.swap(false, Ordering::SeqCst) {
      return Err(MemoryError::Injected("content delete"));
    }
    lock(&self.documents).remove(id);
    Ok(())
  }
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct DirectoryState {
  actors:   HashMap<Uuid, Role>,
  students: HashMap<Uuid, Student>,
  advisors: HashMap<Uuid, Advisor>,
}

/// In-memory [`Directory`] seeded directly by tests.
#[derive(Default)]
pub struct MemoryDirectory {
  state: Mutex<DirectoryState>,
}

impl MemoryDirectory {
  pub fn new() -> Self { Self::default() }

  pub fn insert_actor(&self, user_id: Uuid, role: Role) {
    lock(&self.state).actors.insert(user_id, role);
  }

  /// Register a student principal and profile in one step.
  pub fn insert_student(&self, student: Student) {
    let mut state = lock(&self.state);
    state.actors.insert(student.user_id, Role::Student);
    state.students.insert(student.id, student);
  }

  /// Register an advisor principal and profile in one step.
  pub fn insert_advisor(&self, advisor: Advisor) {
    let mut state = lock(&self.state);
    state.actors.insert(advisor.user_id, Role::Advisor);
    state.advisors.insert(advisor.id, advisor);
  }
}

impl Directory for MemoryDirectory {
  type Error = MemoryError;

  async fn resolve_actor(&self, user_id: Uuid) -> Result<Option<Actor>, MemoryError> {
    Ok(
      lock(&self.state)
        .actors
        .get(&user_id)
        .map(|role| Actor { user_id, role: *role }),
    )
  }

  async fn student_by_user(&self, user_id: Uuid) -> Result<Option<Student>, MemoryError> {
    Ok(
      lock(&self.state)
        .students
        .values()
        .find(|s| s.user_id == user_id)
        .copied(),
    )
  }

  async fn advisor_by_user(&self, user_id: Uuid) -> Result<Option<Advisor>, MemoryError> {
    Ok(
      lock(&self.state)
        .advisors
        .values()
        .find(|a| a.user_id == user_id)
        .copied(),
    )
  }

  async fn student(&self, student_id: Uuid) -> Result<Option<Student>, MemoryError> {
    Ok(lock(&self.state).students.get(&student_id).copied())
  }

  async fn advisees(&self, advisor_id: Uuid) -> Result<Vec<Uuid>, MemoryError> {
    Ok(
      lock(&self.state)
        .students
        .values()
        .filter(|s| s.advisor_id == Some(advisor_id))
        .map(|s| s.id)
        .collect(),
    )
  }
}

// ─── File store ──────────────────────────────────────────────────────────────

/// In-memory [`FileStore`] that keeps descriptors for assertions and throws
/// the bytes away.
#[derive(Default)]
pub struct MemoryFileStore {
  stored: Mutex<Vec<Attachment>>,
}

impl MemoryFileStore {
  pub fn new() -> Self { Self::default() }

  pub fn stored(&self) -> Vec<Attachment> { lock(&self.stored).clone() }
}

impl FileStore for MemoryFileStore {
  type Error = MemoryError;

  async fn store(
    &self,
    bytes: Vec<u8>,
    meta: FileMetadata,
  ) -> Result<Attachment, MemoryError> {
    let id = Uuid::new_v4();
    let attachment = Attachment {
      id,
      url: format!("memory://files/{id}/{}", meta.file_name),
      file_name: meta.file_name,
      mime: meta.mime,
      size: bytes.len() as u64,
      uploaded_at: Utc::now(),
    };
    lock(&self.stored).push(attachment.clone());
    Ok(attachment)
  }
}
