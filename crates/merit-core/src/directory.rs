//! The identity-resolution collaborator.
//!
//! Identity, credential and profile management live outside this system;
//! the core consumes only these lightweight lookups. Provisioning of the
//! underlying rows is an external concern.

use std::future::Future;

use uuid::Uuid;

use crate::actor::{Actor, Advisor, Student};

/// Resolution of authenticated principals to roles and profiles, and of the
/// mentorship relation the policy engine scopes by.
pub trait Directory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Resolve a principal to an actor. `None` means the principal is
  /// unknown — the boundary treats that as unauthenticated.
  fn resolve_actor(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Actor>, Self::Error>> + Send + '_;

  /// The student profile owned by a principal, if any.
  fn student_by_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  /// The advisor profile owned by a principal, if any.
  fn advisor_by_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Advisor>, Self::Error>> + Send + '_;

  /// Look up a student profile by student id.
  fn student(
    &self,
    student_id: Uuid,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  /// Ids of every student currently advised by `advisor_id`.
  fn advisees(
    &self,
    advisor_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  /// Whether `advisor_id` is the student's current advisor. Derived from
  /// the student's advisor assignment.
  fn is_advisee(
    &self,
    student_id: Uuid,
    advisor_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_ {
    async move {
      let student = self.student(student_id).await?;
      Ok(
        student
          .and_then(|s| s.advisor_id)
          .is_some_and(|a| a == advisor_id),
      )
    }
  }
}
