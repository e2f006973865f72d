//! Service layer
//!
//! - [`tickets`]: submission, listing, lifecycle and deletion
//! - [`identities`]: login, staff listing, superuser management, bootstrap

pub mod identities;
pub mod tickets;

pub use tickets::{ImageUpload, SubmissionForm};
