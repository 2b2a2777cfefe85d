//! The shared error taxonomy for the achievement lifecycle engine.
//!
//! Store backends carry their own error enums; the coordinator boxes those
//! into [`Error::Store`]. Everything else is a typed, client-meaningful
//! outcome that the HTTP boundary maps onto a status code.

use thiserror::Error;
use uuid::Uuid;

use crate::reference::Status;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed input, unknown enum value, or empty required field.
  /// Always raised before any store mutation.
  #[error("invalid input: {0}")]
  Validation(String),

  /// The record (or a referenced profile) genuinely does not exist.
  #[error("not found: {0}")]
  NotFound(Uuid),

  /// Role, ownership, or mentorship check failed. Deliberately carries no
  /// detail: an unrelated actor must not learn whether the record exists.
  #[error("access denied")]
  AccessDenied,

  /// The status guard for an operation was not satisfied. Reports the
  /// actual persisted status so callers can reconcile optimistic state.
  #[error("invalid transition: status is {current}, operation requires {required}")]
  InvalidTransition { current: Status, required: Status },

  /// A conditional write affected zero rows: a concurrent request moved
  /// the state first. `current` is the status observed on re-read.
  #[error("conflict: a concurrent update won the race{}", fmt_conflict(.current))]
  Conflict { current: Option<Status> },

  /// A reference points at missing content. Store corruption, not a 404.
  #[error("data integrity violation: {0}")]
  DataIntegrity(String),

  /// I/O failure in one of the backing stores or collaborators.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

fn fmt_conflict(current: &Option<Status>) -> String {
  match current {
    Some(status) => format!("; status is now {status}"),
    None => String::new(),
  }
}

impl Error {
  /// Box an arbitrary backend error into [`Error::Store`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
