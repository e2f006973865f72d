//! Data models
//!
//! Shared between helpdesk-server and API consumers.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY); timestamps are epoch millis.

pub mod comment;
pub mod identity;
pub mod ticket;

// Re-exports
pub use comment::*;
pub use identity::*;
pub use ticket::*;
