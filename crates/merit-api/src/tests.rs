//! Router integration tests against in-memory stores.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use merit_core::{
  actor::{Advisor, Role, Student},
  memory::{MemoryContentStore, MemoryDirectory, MemoryFileStore, MemoryReferenceStore},
};
use merit_engine::Coordinator;

use crate::AppState;

type TestState =
  AppState<MemoryReferenceStore, MemoryContentStore, MemoryDirectory, MemoryFileStore>;

struct TestContext {
  state:   TestState,
  admin:   Uuid,
  advisor: Uuid,
  student: Uuid,
  peer:    Uuid,
}

fn context() -> TestContext {
  let references = Arc::new(MemoryReferenceStore::new());
  let content = Arc::new(MemoryContentStore::new());
  let directory = Arc::new(MemoryDirectory::new());
  let files = Arc::new(MemoryFileStore::new());

  let admin = Uuid::new_v4();
  directory.insert_actor(admin, Role::Admin);

  let advisor = Advisor { id: Uuid::new_v4(), user_id: Uuid::new_v4() };
  directory.insert_advisor(advisor);

  let student = Student {
    id:         Uuid::new_v4(),
    user_id:    Uuid::new_v4(),
    advisor_id: Some(advisor.id),
  };
  let peer = Student { id: Uuid::new_v4(), user_id: Uuid::new_v4(), advisor_id: None };
  directory.insert_student(student);
  directory.insert_student(peer);

  let coordinator = Arc::new(Coordinator::new(
    references,
    content,
    Arc::clone(&directory),
    files,
  ));

  TestContext {
    state:   AppState { coordinator, directory },
    admin,
    advisor: advisor.user_id,
    student: student.user_id,
    peer:    peer.user_id,
  }
}

async fn send(
  state: TestState,
  method: &str,
  uri: &str,
  bearer: Option<Uuid>,
  body: Option<Value>,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(user) = bearer {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {user}"));
  }
  let request = match body {
    Some(value) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(value.to_string())),
    None => builder.body(Body::empty()),
  }
  .unwrap();

  crate::router(state).oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

fn competition_body(title: &str) -> Value {
  json!({
    "title": title,
    "description": "placed second nationally",
    "kind": "competition",
    "competition_name": "National Robotics Cup",
    "rank": 2,
    "tags": ["robotics"],
    "points": 30,
  })
}

/// Create a draft as the student and return its id.
async fn create_draft(ctx: &TestContext, title: &str) -> Uuid {
  let response = send(
    ctx.state.clone(),
    "POST",
    "/achievements",
    Some(ctx.student),
    Some(competition_body(title)),
  )
  .await;
  assert_eq!(response.status(), StatusCode::CREATED);
  let body = body_json(response).await;
  body["id"].as_str().unwrap().parse().unwrap()
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_or_unknown_token_is_401() {
  let ctx = context();

  let response = send(ctx.state.clone(), "GET", "/achievements", None, None).await;
  assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

  // A token the directory cannot resolve is still a 401, not a 403.
  let response =
    send(ctx.state.clone(), "GET", "/achievements", Some(Uuid::new_v4()), None).await;
  assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

  let request = Request::builder()
    .method("GET")
    .uri("/achievements")
    .header(header::AUTHORIZATION, "Bearer not-a-uuid")
    .body(Body::empty())
    .unwrap();
  let response = crate::router(ctx.state).oneshot(request).await.unwrap();
  assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ─── Create and read ─────────────────────────────────────────────────────────

#[tokio::test]
async fn create_returns_merged_draft_view() {
  let ctx = context();

  let response = send(
    ctx.state.clone(),
    "POST",
    "/achievements",
    Some(ctx.student),
    Some(competition_body("Robotics Cup silver")),
  )
  .await;
  assert_eq!(response.status(), StatusCode::CREATED);

  let body = body_json(response).await;
  assert_eq!(body["status"], "draft");
  assert_eq!(body["title"], "Robotics Cup silver");
  assert_eq!(body["kind"], "competition");
  assert_eq!(body["competition_name"], "National Robotics Cup");
  assert_eq!(body["points"], 30);
  assert!(body["submitted_at"].is_null());

  let id = body["id"].as_str().unwrap();
  let response = send(
    ctx.state.clone(),
    "GET",
    &format!("/achievements/{id}"),
    Some(ctx.student),
    None,
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(body_json(response).await["id"], id);
}

#[tokio::test]
async fn create_persists_supplied_attachment_descriptors() {
  let ctx = context();

  let mut body = competition_body("Robotics Cup silver");
  body["attachments"] = json!([{
    "id": Uuid::new_v4(),
    "file_name": "scoresheet.pdf",
    "url": "/files/scoresheet.pdf",
    "mime": "application/pdf",
    "size": 2048,
    "uploaded_at": "2026-08-29T12:00:00Z",
  }]);

  let response = send(
    ctx.state.clone(),
    "POST",
    "/achievements",
    Some(ctx.student),
    Some(body),
  )
  .await;
  assert_eq!(response.status(), StatusCode::CREATED);

  let body = body_json(response).await;
  assert_eq!(body["attachments"][0]["file_name"], "scoresheet.pdf");
  assert_eq!(body["attachments"][0]["size"], 2048);
}

#[tokio::test]
async fn get_unknown_id_is_404() {
  let ctx = context();
  let response = send(
    ctx.state.clone(),
    "GET",
    &format!("/achievements/{}", Uuid::new_v4()),
    Some(ctx.admin),
    None,
  )
  .await;
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn peer_cannot_read_anothers_record() {
  let ctx = context();
  let id = create_draft(&ctx, "Private").await;

  let response = send(
    ctx.state.clone(),
    "GET",
    &format!("/achievements/{id}"),
    Some(ctx.peer),
    None,
  )
  .await;
  assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ─── Lifecycle over HTTP ─────────────────────────────────────────────────────

#[tokio::test]
async fn submit_verify_flow() {
  let ctx = context();
  let id = create_draft(&ctx, "Robotics Cup silver").await;

  let response = send(
    ctx.state.clone(),
    "POST",
    &format!("/achievements/{id}/submit"),
    Some(ctx.student),
    None,
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(body_json(response).await["status"], "submitted");

  let response = send(
    ctx.state.clone(),
    "POST",
    &format!("/achievements/{id}/verify"),
    Some(ctx.advisor),
    None,
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);
  let body = body_json(response).await;
  assert_eq!(body["status"], "verified");
  assert_eq!(body["verified_by"], ctx.advisor.to_string());

  let response = send(
    ctx.state.clone(),
    "GET",
    &format!("/achievements/{id}/history"),
    Some(ctx.student),
    None,
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);
  let events = body_json(response).await;
  let statuses: Vec<&str> = events
    .as_array()
    .unwrap()
    .iter()
    .map(|e| e["status"].as_str().unwrap())
    .collect();
  assert_eq!(statuses, vec!["draft", "submitted", "verified"]);
}

#[tokio::test]
async fn reject_requires_note_and_records_it() {
  let ctx = context();
  let id = create_draft(&ctx, "Disputed").await;
  send(
    ctx.state.clone(),
    "POST",
    &format!("/achievements/{id}/submit"),
    Some(ctx.student),
    None,
  )
  .await;

  let response = send(
    ctx.state.clone(),
    "POST",
    &format!("/achievements/{id}/reject"),
    Some(ctx.advisor),
    Some(json!({ "rejection_note": "   " })),
  )
  .await;
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);

  let response = send(
    ctx.state.clone(),
    "POST",
    &format!("/achievements/{id}/reject"),
    Some(ctx.advisor),
    Some(json!({ "rejection_note": "certificate is illegible" })),
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);
  let body = body_json(response).await;
  assert_eq!(body["status"], "rejected");
  assert_eq!(body["rejection_note"], "certificate is illegible");
  assert!(body["verified_by"].is_null());
}

#[tokio::test]
async fn wrong_state_and_wrong_role_status_codes() {
  let ctx = context();
  let id = create_draft(&ctx, "Status codes").await;

  // Students never verify, not even their own submissions.
  send(
    ctx.state.clone(),
    "POST",
    &format!("/achievements/{id}/submit"),
    Some(ctx.student),
    None,
  )
  .await;
  let response = send(
    ctx.state.clone(),
    "POST",
    &format!("/achievements/{id}/verify"),
    Some(ctx.student),
    None,
  )
  .await;
  assert_eq!(response.status(), StatusCode::FORBIDDEN);

  // Submitted records cannot be edited or deleted.
  let response = send(
    ctx.state.clone(),
    "PATCH",
    &format!("/achievements/{id}"),
    Some(ctx.student),
    Some(json!({ "title": "too late" })),
  )
  .await;
  assert_eq!(response.status(), StatusCode::CONFLICT);

  let response = send(
    ctx.state.clone(),
    "DELETE",
    &format!("/achievements/{id}"),
    Some(ctx.student),
    None,
  )
  .await;
  assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn patch_updates_draft_content() {
  let ctx = context();
  let id = create_draft(&ctx, "Before").await;

  let response = send(
    ctx.state.clone(),
    "PATCH",
    &format!("/achievements/{id}"),
    Some(ctx.student),
    Some(json!({ "title": "After", "points": 45 })),
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);
  let body = body_json(response).await;
  assert_eq!(body["title"], "After");
  assert_eq!(body["points"], 45);
  assert_eq!(body["description"], "placed second nationally");
}

#[tokio::test]
async fn delete_tombstones_and_list_hides_it() {
  let ctx = context();
  let id = create_draft(&ctx, "Abandoned").await;

  let response = send(
    ctx.state.clone(),
    "DELETE",
    &format!("/achievements/{id}"),
    Some(ctx.student),
    None,
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(body_json(response).await["status"], "deleted");

  let response =
    send(ctx.state.clone(), "GET", "/achievements", Some(ctx.student), None).await;
  let body = body_json(response).await;
  assert_eq!(body["pagination"]["total"], 0);

  let response = send(
    ctx.state.clone(),
    "GET",
    "/achievements?status=deleted",
    Some(ctx.student),
    None,
  )
  .await;
  let body = body_json(response).await;
  assert_eq!(body["pagination"]["total"], 1);
  assert_eq!(body["items"][0]["id"], id.to_string());
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_envelope_and_limit_fallback() {
  let ctx = context();
  for i in 0..3 {
    create_draft(&ctx, &format!("Entry {i}")).await;
  }

  let response = send(
    ctx.state.clone(),
    "GET",
    "/achievements?page=2&limit=2",
    Some(ctx.student),
    None,
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);
  let body = body_json(response).await;
  assert_eq!(body["items"].as_array().unwrap().len(), 1);
  assert_eq!(body["pagination"]["page"], 2);
  assert_eq!(body["pagination"]["limit"], 2);
  assert_eq!(body["pagination"]["total"], 3);
  assert_eq!(body["pagination"]["total_pages"], 2);

  // An out-of-range limit falls back to the default rather than erroring.
  let response = send(
    ctx.state.clone(),
    "GET",
    "/achievements?limit=500",
    Some(ctx.student),
    None,
  )
  .await;
  let body = body_json(response).await;
  assert_eq!(body["pagination"]["limit"], 10);
}

// ─── Attachments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn attachment_upload_appends_descriptor() {
  let ctx = context();
  let id = create_draft(&ctx, "With evidence").await;

  let request = Request::builder()
    .method("POST")
    .uri(format!("/achievements/{id}/attachments?file_name=certificate.pdf"))
    .header(header::AUTHORIZATION, format!("Bearer {}", ctx.student))
    .header(header::CONTENT_TYPE, "application/pdf")
    .body(Body::from(&b"%PDF-1.4 evidence"[..]))
    .unwrap();
  let response = crate::router(ctx.state.clone())
    .oneshot(request)
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::CREATED);
  let body = body_json(response).await;
  assert_eq!(body["file_name"], "certificate.pdf");
  assert_eq!(body["mime"], "application/pdf");

  let response = send(
    ctx.state.clone(),
    "GET",
    &format!("/achievements/{id}"),
    Some(ctx.student),
    None,
  )
  .await;
  let body = body_json(response).await;
  assert_eq!(body["attachments"].as_array().unwrap().len(), 1);
}
