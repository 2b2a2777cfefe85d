//! The access-policy engine.
//!
//! Given an actor and a target record, decides whether an operation is
//! permitted and what a listing may show. Every decision resolves the
//! mentorship relation through the directory at evaluation time, so a
//! reassigned advisee is invisible to the old advisor immediately.
//!
//! A failed check is always [`Error::AccessDenied`]; existence failures are
//! the coordinator's business and must never be conflated with access.

use std::sync::Arc;

use uuid::Uuid;

use merit_core::{
  Error, Result,
  actor::{Actor, Role},
  directory::Directory,
  reference::AchievementReference,
  store::OwnerScope,
};

pub struct AccessPolicy<D> {
  directory: Arc<D>,
}

impl<D: Directory> AccessPolicy<D> {
  pub fn new(directory: Arc<D>) -> Self { Self { directory } }

  pub fn directory(&self) -> &Arc<D> { &self.directory }

  /// Resolve the student a create operation targets.
  ///
  /// Students create for themselves; an admin must name the target
  /// explicitly. Advisors cannot create.
  pub async fn resolve_create_target(
    &self,
    actor: &Actor,
    requested: Option<Uuid>,
  ) -> Result<Uuid> {
    match actor.role {
      Role::Student => {
        let own = self
          .directory
          .student_by_user(actor.user_id)
          .await
          .map_err(Error::store)?
          .ok_or(Error::AccessDenied)?;
        // A student naming someone else is an access failure, not a typo.
        match requested {
          Some(id) if id != own.id => Err(Error::AccessDenied),
          _ => Ok(own.id),
        }
      }
      Role::Admin => {
        let target = requested.ok_or_else(|| {
          Error::Validation("student_id is required when creating on behalf".into())
        })?;
        self
          .directory
          .student(target)
          .await
          .map_err(Error::store)?
          .ok_or(Error::NotFound(target))?;
        Ok(target)
      }
      Role::Advisor => Err(Error::AccessDenied),
    }
  }

  /// May `actor` see this record at all (direct get, history)?
  pub async fn authorize_view(
    &self,
    actor: &Actor,
    reference: &AchievementReference,
  ) -> Result<()> {
    match actor.role {
      Role::Admin => Ok(()),
      Role::Student => self.require_owner(actor, reference).await,
      Role::Advisor => self.require_advisor_of_owner(actor, reference).await,
    }
  }

  /// May `actor` mutate content or move the record through the
  /// student-side transitions (update, attach, submit, soft-delete)?
  pub async fn authorize_mutation(
    &self,
    actor: &Actor,
    reference: &AchievementReference,
  ) -> Result<()> {
    match actor.role {
      Role::Admin => Ok(()),
      Role::Student => self.require_owner(actor, reference).await,
      Role::Advisor => Err(Error::AccessDenied),
    }
  }

  /// May `actor` verify or reject this record?
  pub async fn authorize_review(
    &self,
    actor: &Actor,
    reference: &AchievementReference,
  ) -> Result<()> {
    match actor.role {
      Role::Admin => Ok(()),
      Role::Advisor => self.require_advisor_of_owner(actor, reference).await,
      Role::Student => Err(Error::AccessDenied),
    }
  }

  /// The ownership scope `actor`'s listings are restricted to.
  pub async fn list_scope(&self, actor: &Actor) -> Result<OwnerScope> {
    match actor.role {
      Role::Admin => Ok(OwnerScope::All),
      Role::Student => {
        let student = self
          .directory
          .student_by_user(actor.user_id)
          .await
          .map_err(Error::store)?
          .ok_or(Error::AccessDenied)?;
        Ok(OwnerScope::Student(student.id))
      }
      Role::Advisor => {
        let advisor = self
          .directory
          .advisor_by_user(actor.user_id)
          .await
          .map_err(Error::store)?
          .ok_or(Error::AccessDenied)?;
        let advisees = self
          .directory
          .advisees(advisor.id)
          .await
          .map_err(Error::store)?;
        Ok(OwnerScope::Students(advisees))
      }
    }
  }

  async fn require_owner(
    &self,
    actor: &Actor,
    reference: &AchievementReference,
  ) -> Result<()> {
    let student = self
      .directory
      .student_by_user(actor.user_id)
      .await
      .map_err(Error::store)?;
    match student {
      Some(s) if s.id == reference.student_id => Ok(()),
      _ => Err(Error::AccessDenied),
    }
  }

  async fn require_advisor_of_owner(
    &self,
    actor: &Actor,
    reference: &AchievementReference,
  ) -> Result<()> {
    let advisor = self
      .directory
      .advisor_by_user(actor.user_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::AccessDenied)?;
    let advised = self
      .directory
      .is_advisee(reference.student_id, advisor.id)
      .await
      .map_err(Error::store)?;
    if advised { Ok(()) } else { Err(Error::AccessDenied) }
  }
}
