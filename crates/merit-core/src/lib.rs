//! Core types and trait definitions for the Merit achievement tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod actor;
pub mod content;
pub mod directory;
pub mod error;
pub mod files;
pub mod memory;
pub mod reference;
pub mod store;

pub use error::{Error, Result};
