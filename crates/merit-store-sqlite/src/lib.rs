//! SQLite backends for the achievement stores.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. The reference store, the content
//! store and the directory each hold their own connection; nothing here
//! assumes they share a database file.

mod content;
mod directory;
mod encode;
mod reference;
mod schema;

pub mod error;

pub use content::SqliteContentStore;
pub use directory::SqliteDirectory;
pub use error::{Error, Result};
pub use reference::SqliteReferenceStore;

#[cfg(test)]
mod tests;
