//! Actors and the roles the policy engine reasons about.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role an authenticated principal acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Advisor,
  Student,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Admin => "admin",
      Self::Advisor => "advisor",
      Self::Student => "student",
    }
  }
}

impl std::fmt::Display for Role {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for Role {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "admin" => Ok(Self::Admin),
      "advisor" => Ok(Self::Advisor),
      "student" => Ok(Self::Student),
      other => Err(format!("unknown role: {other:?}")),
    }
  }
}

/// An authenticated principal, resolved by the directory collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub user_id: Uuid,
  pub role:    Role,
}

/// A student profile, as far as the policy engine needs to know it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  pub id:         Uuid,
  pub user_id:    Uuid,
  /// The student's current advisor, if one is assigned.
  pub advisor_id: Option<Uuid>,
}

/// An advisor profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisor {
  pub id:      Uuid,
  pub user_id: Uuid,
}
