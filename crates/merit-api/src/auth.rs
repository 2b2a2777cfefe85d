//! Bearer-token authentication against the directory.
//!
//! The token is the caller's user id; an upstream gateway is expected to
//! have already validated the session and forwarded the identity. Anything
//! the directory cannot resolve is a 401, never a 403 — role decisions
//! belong to the policy engine.

use axum::http::{HeaderMap, header};
use merit_core::directory::Directory;
use uuid::Uuid;

use crate::error::ApiError;

/// Resolve the request's `Authorization: Bearer <user-id>` header to an
/// [`merit_core::actor::Actor`].
pub async fn authenticate<D>(
  headers: &HeaderMap,
  directory: &D,
) -> Result<merit_core::actor::Actor, ApiError>
where
  D: Directory,
{
  let token = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .ok_or(ApiError::Unauthorized)?;

  let user_id = Uuid::parse_str(token.trim()).map_err(|_| ApiError::Unauthorized)?;

  directory
    .resolve_actor(user_id)
    .await
    .map_err(|e| ApiError::Core(merit_core::Error::store(e)))?
    .ok_or(ApiError::Unauthorized)
}
