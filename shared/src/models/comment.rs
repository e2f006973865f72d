//! Comment Model

use serde::{Deserialize, Serialize};

/// Comment on a ticket (immutable once written)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Comment {
    pub id: i64,
    pub ticket_id: i64,
    pub author_name: String,
    pub body: String,
    pub created_at: i64,
}
