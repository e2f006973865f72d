//! Shared types for the helpdesk
//!
//! Types used by the server and by API consumers: error codes and the
//! response envelope, pagination, and the ticket/identity/comment models.

pub mod error;
pub mod models;
pub mod pagination;
pub mod util;

// Re-exports
pub use axum::Json;
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use http;
pub use pagination::PaginatedResponse;
pub use serde::{Deserialize, Serialize};
