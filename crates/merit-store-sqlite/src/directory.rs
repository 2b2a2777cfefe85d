//! [`SqliteDirectory`] — the SQLite implementation of the principal
//! directory: who each user is, and which advisor mentors which student.

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use merit_core::{
  actor::{Actor, Advisor, Role, Student},
  directory::Directory,
};

use crate::{
  Result,
  encode::{decode_role, decode_uuid, encode_role, encode_uuid},
  schema::DIRECTORY_SCHEMA,
};

#[derive(Clone)]
pub struct SqliteDirectory {
  conn: tokio_rusqlite::Connection,
}

impl SqliteDirectory {
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let directory = Self { conn };
    directory.init_schema().await?;
    Ok(directory)
  }

  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let directory = Self { conn };
    directory.init_schema().await?;
    Ok(directory)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(DIRECTORY_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Provisioning ──────────────────────────────────────────────────────────

  /// Register (or re-register) a bare principal.
  pub async fn upsert_user(&self, user_id: Uuid, role: Role) -> Result<()> {
    let id_str   = encode_uuid(user_id);
    let role_str = encode_role(role).to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, role) VALUES (?1, ?2)
           ON CONFLICT (user_id) DO UPDATE SET role = excluded.role",
          rusqlite::params![id_str, role_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Register a student profile together with its principal.
  pub async fn upsert_student(&self, student: Student) -> Result<()> {
    self.upsert_user(student.user_id, Role::Student).await?;

    let id_str      = encode_uuid(student.id);
    let user_str    = encode_uuid(student.user_id);
    let advisor_str = student.advisor_id.map(encode_uuid);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO students (student_id, user_id, advisor_id) VALUES (?1, ?2, ?3)
           ON CONFLICT (student_id) DO UPDATE SET advisor_id = excluded.advisor_id",
          rusqlite::params![id_str, user_str, advisor_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Register an advisor profile together with its principal.
  pub async fn upsert_advisor(&self, advisor: Advisor) -> Result<()> {
    self.upsert_user(advisor.user_id, Role::Advisor).await?;

    let id_str   = encode_uuid(advisor.id);
    let user_str = encode_uuid(advisor.user_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO advisors (advisor_id, user_id) VALUES (?1, ?2)
           ON CONFLICT (advisor_id) DO NOTHING",
          rusqlite::params![id_str, user_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl Directory for SqliteDirectory {
  type Error = crate::Error;

  async fn resolve_actor(&self, user_id: Uuid) -> Result<Option<Actor>> {
    let id_str = encode_uuid(user_id);

    let role_str: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT role FROM users WHERE user_id = ?1",
              rusqlite::params![id_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    role_str
      .map(|r| Ok(Actor { user_id, role: decode_role(&r)? }))
      .transpose()
  }

  async fn student_by_user(&self, user_id: Uuid) -> Result<Option<Student>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<(String, String, Option<String>)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT student_id, user_id, advisor_id FROM students WHERE user_id = ?1",
              rusqlite::params![id_str],
              |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(decode_student).transpose()
  }

  async fn advisor_by_user(&self, user_id: Uuid) -> Result<Option<Advisor>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT advisor_id, user_id FROM advisors WHERE user_id = ?1",
              rusqlite::params![id_str],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(id, user)| {
        Ok(Advisor { id: decode_uuid(&id)?, user_id: decode_uuid(&user)? })
      })
      .transpose()
  }

  async fn student(&self, student_id: Uuid) -> Result<Option<Student>> {
    let id_str = encode_uuid(student_id);

    let raw: Option<(String, String, Option<String>)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT student_id, user_id, advisor_id FROM students WHERE student_id = ?1",
              rusqlite::params![id_str],
              |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(decode_student).transpose()
  }

  async fn advisees(&self, advisor_id: Uuid) -> Result<Vec<Uuid>> {
    let id_str = encode_uuid(advisor_id);

    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare("SELECT student_id FROM students WHERE advisor_id = ?1")?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    ids.iter().map(|s| decode_uuid(s)).collect()
  }
}

fn decode_student((id, user, advisor): (String, String, Option<String>)) -> Result<Student> {
  Ok(Student {
    id:         decode_uuid(&id)?,
    user_id:    decode_uuid(&user)?,
    advisor_id: advisor.as_deref().map(decode_uuid).transpose()?,
  })
}
