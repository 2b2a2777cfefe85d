//! JSON REST API for the achievement verification service.
//!
//! Exposes an axum [`Router`] over a [`merit_engine::Coordinator`]. Callers
//! authenticate with `Authorization: Bearer <user-id>`; session handling and
//! TLS belong to the gateway in front of this service.

pub mod achievements;
pub mod auth;
pub mod error;
pub mod files;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;

use merit_core::{
  directory::Directory,
  files::FileStore,
  store::{ContentStore, ReferenceStore},
};
use merit_engine::Coordinator;

pub use error::ApiError;
pub use files::DiskFileStore;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// `MERIT_*` environment.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "defaults::host")]
  pub host:           String,
  #[serde(default = "defaults::port")]
  pub port:           u16,
  #[serde(default = "defaults::reference_db")]
  pub reference_db:   PathBuf,
  #[serde(default = "defaults::content_db")]
  pub content_db:     PathBuf,
  #[serde(default = "defaults::directory_db")]
  pub directory_db:   PathBuf,
  #[serde(default = "defaults::files_dir")]
  pub files_dir:      PathBuf,
  #[serde(default = "defaults::files_base_url")]
  pub files_base_url: String,
}

mod defaults {
  use std::path::PathBuf;

  pub fn host() -> String { "127.0.0.1".into() }
  pub fn port() -> u16 { 8080 }
  pub fn reference_db() -> PathBuf { "merit-references.db".into() }
  pub fn content_db() -> PathBuf { "merit-content.db".into() }
  pub fn directory_db() -> PathBuf { "merit-directory.db".into() }
  pub fn files_dir() -> PathBuf { "merit-files".into() }
  pub fn files_base_url() -> String { "/files".into() }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<R, C, D, F> {
  pub coordinator: Arc<Coordinator<R, C, D, F>>,
  /// Also reachable through the coordinator's policy; kept here so the
  /// auth layer does not dig through engine internals.
  pub directory:   Arc<D>,
}

impl<R, C, D, F> Clone for AppState<R, C, D, F> {
  fn clone(&self) -> Self {
    Self {
      coordinator: Arc::clone(&self.coordinator),
      directory:   Arc::clone(&self.directory),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the achievement API router for `state`.
pub fn router<R, C, D, F>(state: AppState<R, C, D, F>) -> Router
where
  R: ReferenceStore + 'static,
  C: ContentStore + 'static,
  D: Directory + 'static,
  F: FileStore + 'static,
{
  Router::new()
    .route(
      "/achievements",
      get(achievements::list::<R, C, D, F>).post(achievements::create::<R, C, D, F>),
    )
    .route(
      "/achievements/{id}",
      get(achievements::get_one::<R, C, D, F>)
        .patch(achievements::update::<R, C, D, F>)
        .delete(achievements::delete_one::<R, C, D, F>),
    )
    .route("/achievements/{id}/submit", post(achievements::submit::<R, C, D, F>))
    .route("/achievements/{id}/verify", post(achievements::verify::<R, C, D, F>))
    .route("/achievements/{id}/reject", post(achievements::reject::<R, C, D, F>))
    .route("/achievements/{id}/history", get(achievements::history::<R, C, D, F>))
    .route(
      "/achievements/{id}/attachments",
      post(achievements::attach::<R, C, D, F>),
    )
    .with_state(state)
}

#[cfg(test)]
mod tests;
