//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Missing, malformed or unresolvable bearer token.
  #[error("authentication required")]
  Unauthorized,

  #[error(transparent)]
  Core(#[from] merit_core::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    use merit_core::Error as Core;

    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Core(Core::Validation(_)) => StatusCode::BAD_REQUEST,
      ApiError::Core(Core::NotFound(_)) => StatusCode::NOT_FOUND,
      ApiError::Core(Core::AccessDenied) => StatusCode::FORBIDDEN,
      // Both are "the workflow state does not allow this", whether seen
      // before the write or lost to a concurrent one.
      ApiError::Core(Core::InvalidTransition { .. } | Core::Conflict { .. }) => {
        StatusCode::CONFLICT
      }
      ApiError::Core(Core::DataIntegrity(_) | Core::Store(_)) | ApiError::Json(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };

    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
