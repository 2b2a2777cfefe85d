//! SQL schemata for the three SQLite-backed stores.
//!
//! Each is executed once at connection startup and gated on
//! `PRAGMA user_version` for future migrations. The three stores never share
//! tables; a shared database file works, but is not assumed.

/// The reference authority store: one row per achievement, the canonical
/// workflow record.
pub const REFERENCE_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS achievement_references (
    id             TEXT PRIMARY KEY,
    student_id     TEXT NOT NULL,
    content_id     TEXT NOT NULL UNIQUE,  -- pointer into the content store
    status         TEXT NOT NULL,         -- 'draft' | 'submitted' | 'verified' | 'rejected' | 'deleted'
    submitted_at   TEXT,
    verified_at    TEXT,
    verified_by    TEXT,
    rejection_note TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS refs_student_idx ON achievement_references(student_id);
CREATE INDEX IF NOT EXISTS refs_status_idx  ON achievement_references(status);
CREATE INDEX IF NOT EXISTS refs_created_idx ON achievement_references(created_at);

PRAGMA user_version = 1;
";

/// The content store: a plain document table. The full content record is a
/// JSON document; the owner column exists only for ad-hoc inspection.
pub const CONTENT_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS achievement_content (
    content_id TEXT PRIMARY KEY,
    student_id TEXT NOT NULL,
    document   TEXT NOT NULL      -- full JSON content record
);

CREATE INDEX IF NOT EXISTS content_student_idx ON achievement_content(student_id);

PRAGMA user_version = 1;
";

/// The directory: principals, student profiles and advisor profiles.
pub const DIRECTORY_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    role    TEXT NOT NULL         -- 'admin' | 'advisor' | 'student'
);

CREATE TABLE IF NOT EXISTS students (
    student_id TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL UNIQUE REFERENCES users(user_id),
    advisor_id TEXT
);

CREATE TABLE IF NOT EXISTS advisors (
    advisor_id TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL UNIQUE REFERENCES users(user_id)
);

CREATE INDEX IF NOT EXISTS students_advisor_idx ON students(advisor_id);

PRAGMA user_version = 1;
";
