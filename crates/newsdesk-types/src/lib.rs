//! Shared type definitions for the Newsdesk content-management system.
//!
//! This crate is the single source of truth for the types that cross the
//! data-layer boundary: record identifiers, optimistic-concurrency version
//! tokens, the [`Record`] capability trait, and the concrete newsroom
//! entities persisted by `newsdesk-db`.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier and version-token newtypes
//! - [`record`] -- The [`Record`] capability trait
//! - [`entities`] -- Concrete newsroom entities (languages, news items)

pub mod entities;
pub mod ids;
pub mod record;

// Re-export all public types at crate root for convenience.
pub use entities::{Language, NewsItem};
pub use ids::{RecordId, VersionToken};
pub use record::Record;
