//! Handlers for `/achievements` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/achievements` | `?status=`, `?page=`, `?limit=` |
//! | `POST`   | `/achievements` | 201; students create their own, admins name a student |
//! | `GET`    | `/achievements/:id` | merged workflow + content view |
//! | `PATCH`  | `/achievements/:id` | partial content update, draft only |
//! | `DELETE` | `/achievements/:id` | soft delete, draft only |
//! | `POST`   | `/achievements/:id/submit` | draft → submitted |
//! | `POST`   | `/achievements/:id/verify` | submitted → verified |
//! | `POST`   | `/achievements/:id/reject` | submitted → rejected, note required |
//! | `GET`    | `/achievements/:id/history` | status timeline |
//! | `POST`   | `/achievements/:id/attachments` | raw body + `?file_name=` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use merit_core::{
  content::{AchievementDetails, Attachment, ContentPatch},
  directory::Directory,
  files::{FileMetadata, FileStore},
  reference::Status,
  store::{ContentStore, Page, PageOf, ReferenceStore, StatusFilter},
};
use merit_engine::{AchievementRecord, NewAchievement};

use crate::{AppState, auth::authenticate, error::ApiError};

// ─── Views ───────────────────────────────────────────────────────────────────

/// Merge a record into the flat wire view: workflow fields, content fields
/// and the details payload (tagged with `kind`) at one level.
fn record_view(record: &AchievementRecord) -> Result<Json<Value>, ApiError> {
  let mut view = serde_json::Map::new();
  let reference = &record.reference;
  let content = &record.content;

  view.insert("id".into(), serde_json::to_value(reference.id)?);
  view.insert("student_id".into(), serde_json::to_value(reference.student_id)?);
  view.insert("status".into(), serde_json::to_value(reference.status)?);
  view.insert("submitted_at".into(), serde_json::to_value(reference.submitted_at)?);
  view.insert("verified_at".into(), serde_json::to_value(reference.verified_at)?);
  view.insert("verified_by".into(), serde_json::to_value(reference.verified_by)?);
  view.insert(
    "rejection_note".into(),
    serde_json::to_value(&reference.rejection_note)?,
  );
  view.insert("created_at".into(), serde_json::to_value(reference.created_at)?);
  view.insert("updated_at".into(), serde_json::to_value(reference.updated_at)?);

  view.insert("title".into(), serde_json::to_value(&content.title)?);
  view.insert("description".into(), serde_json::to_value(&content.description)?);
  view.insert("attachments".into(), serde_json::to_value(&content.attachments)?);
  view.insert("tags".into(), serde_json::to_value(&content.tags)?);
  view.insert("points".into(), serde_json::to_value(content.points)?);

  // The details variant flattens in, bringing its `kind` tag along.
  if let Value::Object(details) = serde_json::to_value(&content.details)? {
    view.extend(details);
  }

  Ok(Json(Value::Object(view)))
}

#[derive(Debug, Serialize)]
struct Pagination {
  page:        usize,
  limit:       usize,
  total:       usize,
  total_pages: usize,
}

#[derive(Debug, Serialize)]
struct PageEnvelope<T> {
  items:      Vec<T>,
  pagination: Pagination,
}

fn envelope<T>(page: PageOf<T>) -> PageEnvelope<T> {
  let pagination = Pagination {
    page:        page.page,
    limit:       page.limit,
    total:       page.total,
    total_pages: page.total_pages(),
  };
  PageEnvelope { items: page.items, pagination }
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  /// Required when an admin creates on behalf of a student.
  pub student_id:  Option<Uuid>,
  pub title:       String,
  #[serde(default)]
  pub description: String,
  /// The `kind` field selects the details variant; its fields sit at the
  /// top level of the body.
  #[serde(flatten)]
  pub details:     AchievementDetails,
  /// Descriptors for files uploaded ahead of time; raw uploads go through
  /// `POST /achievements/:id/attachments` instead.
  #[serde(default)]
  pub attachments: Vec<Attachment>,
  #[serde(default)]
  pub tags:        Vec<String>,
  #[serde(default)]
  pub points:      u32,
}

/// `POST /achievements`
pub async fn create<R, C, D, F>(
  State(state): State<AppState<R, C, D, F>>,
  headers: HeaderMap,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  R: ReferenceStore + 'static,
  C: ContentStore + 'static,
  D: Directory + 'static,
  F: FileStore + 'static,
{
  let actor = authenticate(&headers, state.directory.as_ref()).await?;

  let record = state
    .coordinator
    .create(&actor, NewAchievement {
      student_id:  body.student_id,
      title:       body.title,
      description: body.description,
      details:     body.details,
      attachments: body.attachments,
      tags:        body.tags,
      points:      body.points,
    })
    .await?;

  Ok((StatusCode::CREATED, record_view(&record)?))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<Status>,
  pub page:   Option<usize>,
  pub limit:  Option<usize>,
}

/// `GET /achievements[?status=&page=&limit=]`
pub async fn list<R, C, D, F>(
  State(state): State<AppState<R, C, D, F>>,
  headers: HeaderMap,
  Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError>
where
  R: ReferenceStore + 'static,
  C: ContentStore + 'static,
  D: Directory + 'static,
  F: FileStore + 'static,
{
  let actor = authenticate(&headers, state.directory.as_ref()).await?;

  let status = params.status.map(StatusFilter::Only).unwrap_or_default();
  let page = Page {
    page:  params.page.unwrap_or(1),
    limit: params.limit.unwrap_or(Page::DEFAULT_LIMIT),
  };

  let page = state.coordinator.list(&actor, status, page).await?;
  Ok(Json(envelope(page)))
}

// ─── Single record ───────────────────────────────────────────────────────────

/// `GET /achievements/:id`
pub async fn get_one<R, C, D, F>(
  State(state): State<AppState<R, C, D, F>>,
  headers: HeaderMap,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  R: ReferenceStore + 'static,
  C: ContentStore + 'static,
  D: Directory + 'static,
  F: FileStore + 'static,
{
  let actor = authenticate(&headers, state.directory.as_ref()).await?;
  let record = state.coordinator.get(&actor, id).await?;
  record_view(&record)
}

/// `PATCH /achievements/:id`
pub async fn update<R, C, D, F>(
  State(state): State<AppState<R, C, D, F>>,
  headers: HeaderMap,
  Path(id): Path<Uuid>,
  Json(patch): Json<ContentPatch>,
) -> Result<impl IntoResponse, ApiError>
where
  R: ReferenceStore + 'static,
  C: ContentStore + 'static,
  D: Directory + 'static,
  F: FileStore + 'static,
{
  let actor = authenticate(&headers, state.directory.as_ref()).await?;
  let record = state.coordinator.update(&actor, id, patch).await?;
  record_view(&record)
}

/// `DELETE /achievements/:id`
pub async fn delete_one<R, C, D, F>(
  State(state): State<AppState<R, C, D, F>>,
  headers: HeaderMap,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  R: ReferenceStore + 'static,
  C: ContentStore + 'static,
  D: Directory + 'static,
  F: FileStore + 'static,
{
  let actor = authenticate(&headers, state.directory.as_ref()).await?;
  let reference = state.coordinator.delete(&actor, id).await?;
  Ok(Json(reference))
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// `POST /achievements/:id/submit`
pub async fn submit<R, C, D, F>(
  State(state): State<AppState<R, C, D, F>>,
  headers: HeaderMap,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  R: ReferenceStore + 'static,
  C: ContentStore + 'static,
  D: Directory + 'static,
  F: FileStore + 'static,
{
  let actor = authenticate(&headers, state.directory.as_ref()).await?;
  let reference = state.coordinator.submit(&actor, id).await?;
  Ok(Json(reference))
}

/// `POST /achievements/:id/verify`
pub async fn verify<R, C, D, F>(
  State(state): State<AppState<R, C, D, F>>,
  headers: HeaderMap,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  R: ReferenceStore + 'static,
  C: ContentStore + 'static,
  D: Directory + 'static,
  F: FileStore + 'static,
{
  let actor = authenticate(&headers, state.directory.as_ref()).await?;
  let reference = state.coordinator.verify(&actor, id).await?;
  Ok(Json(reference))
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
  pub rejection_note: String,
}

/// `POST /achievements/:id/reject` — body: `{"rejection_note":"..."}`
pub async fn reject<R, C, D, F>(
  State(state): State<AppState<R, C, D, F>>,
  headers: HeaderMap,
  Path(id): Path<Uuid>,
  Json(body): Json<RejectBody>,
) -> Result<impl IntoResponse, ApiError>
where
  R: ReferenceStore + 'static,
  C: ContentStore + 'static,
  D: Directory + 'static,
  F: FileStore + 'static,
{
  let actor = authenticate(&headers, state.directory.as_ref()).await?;
  let reference = state
    .coordinator
    .reject(&actor, id, body.rejection_note)
    .await?;
  Ok(Json(reference))
}

/// `GET /achievements/:id/history`
pub async fn history<R, C, D, F>(
  State(state): State<AppState<R, C, D, F>>,
  headers: HeaderMap,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  R: ReferenceStore + 'static,
  C: ContentStore + 'static,
  D: Directory + 'static,
  F: FileStore + 'static,
{
  let actor = authenticate(&headers, state.directory.as_ref()).await?;
  let events = state.coordinator.history(&actor, id).await?;
  Ok(Json(events))
}

// ─── Attachments ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AttachParams {
  pub file_name: Option<String>,
}

/// `POST /achievements/:id/attachments?file_name=<name>` — raw file body;
/// the MIME type comes from the `Content-Type` header.
pub async fn attach<R, C, D, F>(
  State(state): State<AppState<R, C, D, F>>,
  headers: HeaderMap,
  Path(id): Path<Uuid>,
  Query(params): Query<AttachParams>,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  R: ReferenceStore + 'static,
  C: ContentStore + 'static,
  D: Directory + 'static,
  F: FileStore + 'static,
{
  let actor = authenticate(&headers, state.directory.as_ref()).await?;

  let mime = headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or("application/octet-stream")
    .to_owned();
  let meta = FileMetadata {
    file_name: params.file_name.unwrap_or_default(),
    mime,
  };

  let attachment = state
    .coordinator
    .attach(&actor, id, body.to_vec(), meta)
    .await?;
  Ok((StatusCode::CREATED, Json(attachment)))
}
