//! Integration tests for the SQLite stores against in-memory databases.

use chrono::Utc;
use uuid::Uuid;

use merit_core::{
  actor::{Advisor, Role, Student},
  content::{AchievementDetails, ContentId, NewContent},
  directory::Directory,
  reference::{AchievementReference, ReferenceUpdate, Status},
  store::{ContentStore, ListFilter, OwnerScope, Page, ReferenceStore, StatusFilter},
};

use crate::{Error, SqliteContentStore, SqliteDirectory, SqliteReferenceStore};

async fn references() -> SqliteReferenceStore {
  SqliteReferenceStore::open_in_memory()
    .await
    .expect("in-memory reference store")
}

async fn content_store() -> SqliteContentStore {
  SqliteContentStore::open_in_memory()
    .await
    .expect("in-memory content store")
}

fn draft(student_id: Uuid) -> AchievementReference {
  AchievementReference::draft(student_id, ContentId::new(Uuid::new_v4().simple().to_string()))
}

fn new_content(student_id: Uuid, title: &str) -> NewContent {
  NewContent {
    student_id,
    title: title.into(),
    description: "issued by the national board".into(),
    details: AchievementDetails::Certification {
      certification_name:   "Cloud Practitioner".into(),
      issued_by:            Some("Examining Board".into()),
      certification_number: Some("CP-0042".into()),
      valid_until:          None,
    },
    attachments: vec![],
    tags: vec!["cert".into()],
    points: 15,
  }
}

// ─── Reference store ─────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_reference() {
  let store = references().await;
  let reference = draft(Uuid::new_v4());

  store.create(&reference).await.unwrap();
  let fetched = store.get(reference.id).await.unwrap().unwrap();

  assert_eq!(fetched.id, reference.id);
  assert_eq!(fetched.student_id, reference.student_id);
  assert_eq!(fetched.content_id, reference.content_id);
  assert_eq!(fetched.status, Status::Draft);
  assert!(fetched.submitted_at.is_none());
}

#[tokio::test]
async fn get_missing_returns_none() {
  let store = references().await;
  assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_id_is_a_dedicated_error() {
  let store = references().await;
  let reference = draft(Uuid::new_v4());

  store.create(&reference).await.unwrap();
  let err = store.create(&reference).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateReference(id) if id == reference.id));
}

#[tokio::test]
async fn conditional_update_applies_only_supplied_fields() {
  let store = references().await;
  let reference = draft(Uuid::new_v4());
  store.create(&reference).await.unwrap();

  let submitted_at = Utc::now();
  let updated = store
    .conditional_update(reference.id, Status::Draft, ReferenceUpdate::submit(submitted_at))
    .await
    .unwrap()
    .expect("draft matches");

  assert_eq!(updated.status, Status::Submitted);
  assert!(updated.submitted_at.is_some());
  assert!(updated.verified_at.is_none());
  assert!(updated.rejection_note.is_none());
  assert!(updated.updated_at >= reference.updated_at);

  // Verification preserves the earlier submitted_at.
  let verifier = Uuid::new_v4();
  let verified = store
    .conditional_update(
      reference.id,
      Status::Submitted,
      ReferenceUpdate::verify(verifier, Utc::now()),
    )
    .await
    .unwrap()
    .expect("submitted matches");

  assert_eq!(verified.status, Status::Verified);
  assert_eq!(verified.verified_by, Some(verifier));
  assert_eq!(verified.submitted_at, updated.submitted_at);
}

#[tokio::test]
async fn conditional_update_misses_on_wrong_status() {
  let store = references().await;
  let reference = draft(Uuid::new_v4());
  store.create(&reference).await.unwrap();

  // Expecting submitted while the row is draft: no match, row untouched.
  let result = store
    .conditional_update(
      reference.id,
      Status::Submitted,
      ReferenceUpdate::verify(Uuid::new_v4(), Utc::now()),
    )
    .await
    .unwrap();
  assert!(result.is_none());

  let row = store.get(reference.id).await.unwrap().unwrap();
  assert_eq!(row.status, Status::Draft);
  assert!(row.verified_at.is_none());

  // Unknown id behaves the same as a status mismatch.
  let result = store
    .conditional_update(Uuid::new_v4(), Status::Draft, ReferenceUpdate::soft_delete())
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn list_excludes_deleted_by_default() {
  let store = references().await;
  let student = Uuid::new_v4();

  let kept = draft(student);
  let tombstoned = draft(student);
  store.create(&kept).await.unwrap();
  store.create(&tombstoned).await.unwrap();
  store
    .conditional_update(tombstoned.id, Status::Draft, ReferenceUpdate::soft_delete())
    .await
    .unwrap()
    .expect("draft matches");

  let filter = ListFilter {
    status: StatusFilter::Default,
    owner:  OwnerScope::Student(student),
    page:   Page::default(),
  };
  let page = store.list(&filter).await.unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.items[0].id, kept.id);

  let filter = ListFilter {
    status: StatusFilter::Only(Status::Deleted),
    owner:  OwnerScope::Student(student),
    page:   Page::default(),
  };
  let page = store.list(&filter).await.unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.items[0].id, tombstoned.id);
}

#[tokio::test]
async fn list_scopes_by_owner() {
  let store = references().await;
  let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
  for student in [a, a, b, c] {
    store.create(&draft(student)).await.unwrap();
  }

  let page = store
    .list(&ListFilter {
      status: StatusFilter::Default,
      owner:  OwnerScope::All,
      page:   Page::default(),
    })
    .await
    .unwrap();
  assert_eq!(page.total, 4);

  let page = store
    .list(&ListFilter {
      status: StatusFilter::Default,
      owner:  OwnerScope::Students(vec![a, b]),
      page:   Page::default(),
    })
    .await
    .unwrap();
  assert_eq!(page.total, 3);

  // Empty advisee set short-circuits to an empty page.
  let page = store
    .list(&ListFilter {
      status: StatusFilter::Default,
      owner:  OwnerScope::Students(vec![]),
      page:   Page::default(),
    })
    .await
    .unwrap();
  assert_eq!(page.total, 0);
  assert!(page.items.is_empty());
}

#[tokio::test]
async fn list_paginates_newest_first() {
  let store = references().await;
  let student = Uuid::new_v4();

  let mut ids = vec![];
  for i in 0..5 {
    let mut reference = draft(student);
    // Spread created_at so the ordering is deterministic.
    reference.created_at += chrono::Duration::seconds(i);
    store.create(&reference).await.unwrap();
    ids.push(reference.id);
  }

  let page = store
    .list(&ListFilter {
      status: StatusFilter::Default,
      owner:  OwnerScope::Student(student),
      page:   Page { page: 1, limit: 2 },
    })
    .await
    .unwrap();
  assert_eq!(page.total, 5);
  assert_eq!(page.items.len(), 2);
  assert_eq!(page.items[0].id, ids[4]);
  assert_eq!(page.items[1].id, ids[3]);

  let page = store
    .list(&ListFilter {
      status: StatusFilter::Default,
      owner:  OwnerScope::Student(student),
      page:   Page { page: 3, limit: 2 },
    })
    .await
    .unwrap();
  assert_eq!(page.items.len(), 1);
  assert_eq!(page.items[0].id, ids[0]);
}

// ─── Content store ───────────────────────────────────────────────────────────

#[tokio::test]
async fn content_roundtrip() {
  let store = content_store().await;
  let student = Uuid::new_v4();

  let created = store.create(new_content(student, "Board certified")).await.unwrap();
  assert_eq!(created.student_id, student);
  assert_eq!(created.points, 15);

  let fetched = store.get(&created.content_id).await.unwrap().unwrap();
  assert_eq!(fetched, created);

  assert!(
    store
      .get(&ContentId::new("nope"))
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn content_update_replaces_document() {
  let store = content_store().await;
  let created = store
    .create(new_content(Uuid::new_v4(), "Before"))
    .await
    .unwrap();

  let mut updated = created.clone();
  updated.title = "After".into();
  updated.tags.push("renewed".into());
  store.update(&created.content_id, &updated).await.unwrap();

  let fetched = store.get(&created.content_id).await.unwrap().unwrap();
  assert_eq!(fetched.title, "After");
  assert_eq!(fetched.tags, vec!["cert".to_string(), "renewed".to_string()]);

  let err = store
    .update(&ContentId::new("nope"), &updated)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ContentNotFound(_)));
}

#[tokio::test]
async fn content_delete_is_idempotent() {
  let store = content_store().await;
  let created = store
    .create(new_content(Uuid::new_v4(), "Ephemeral"))
    .await
    .unwrap();

  store.delete(&created.content_id).await.unwrap();
  assert!(store.get(&created.content_id).await.unwrap().is_none());

  // A second delete of the same id still succeeds.
  store.delete(&created.content_id).await.unwrap();
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn directory_resolves_principals_and_mentorship() {
  let directory = SqliteDirectory::open_in_memory().await.unwrap();

  let admin_user = Uuid::new_v4();
  directory.upsert_user(admin_user, Role::Admin).await.unwrap();

  let advisor = Advisor { id: Uuid::new_v4(), user_id: Uuid::new_v4() };
  directory.upsert_advisor(advisor).await.unwrap();

  let student = Student {
    id:         Uuid::new_v4(),
    user_id:    Uuid::new_v4(),
    advisor_id: Some(advisor.id),
  };
  let loner = Student {
    id:         Uuid::new_v4(),
    user_id:    Uuid::new_v4(),
    advisor_id: None,
  };
  directory.upsert_student(student).await.unwrap();
  directory.upsert_student(loner).await.unwrap();

  let actor = directory.resolve_actor(admin_user).await.unwrap().unwrap();
  assert_eq!(actor.role, Role::Admin);
  let actor = directory.resolve_actor(student.user_id).await.unwrap().unwrap();
  assert_eq!(actor.role, Role::Student);
  assert!(directory.resolve_actor(Uuid::new_v4()).await.unwrap().is_none());

  let profile = directory.student_by_user(student.user_id).await.unwrap().unwrap();
  assert_eq!(profile.id, student.id);
  assert_eq!(profile.advisor_id, Some(advisor.id));

  let profile = directory.advisor_by_user(advisor.user_id).await.unwrap().unwrap();
  assert_eq!(profile.id, advisor.id);

  let advisees = directory.advisees(advisor.id).await.unwrap();
  assert_eq!(advisees, vec![student.id]);

  assert!(directory.is_advisee(student.id, advisor.id).await.unwrap());
  assert!(!directory.is_advisee(loner.id, advisor.id).await.unwrap());
}

#[tokio::test]
async fn directory_upsert_reassigns_advisor() {
  let directory = SqliteDirectory::open_in_memory().await.unwrap();

  let old_advisor = Advisor { id: Uuid::new_v4(), user_id: Uuid::new_v4() };
  let new_advisor = Advisor { id: Uuid::new_v4(), user_id: Uuid::new_v4() };
  directory.upsert_advisor(old_advisor).await.unwrap();
  directory.upsert_advisor(new_advisor).await.unwrap();

  let mut student = Student {
    id:         Uuid::new_v4(),
    user_id:    Uuid::new_v4(),
    advisor_id: Some(old_advisor.id),
  };
  directory.upsert_student(student).await.unwrap();

  student.advisor_id = Some(new_advisor.id);
  directory.upsert_student(student).await.unwrap();

  assert_eq!(directory.advisees(old_advisor.id).await.unwrap(), Vec::<Uuid>::new());
  assert_eq!(directory.advisees(new_advisor.id).await.unwrap(), vec![student.id]);
}
