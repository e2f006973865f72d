//! Identity Model (staff accounts)

use serde::{Deserialize, Serialize};

/// Identity row (includes the password hash, never serialized)
#[derive(Debug, Clone)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub is_superuser: bool,
    pub created_at: i64,
}

/// Identity as exposed by the API (without password)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct IdentityResponse {
    pub id: i64,
    pub username: String,
    pub is_superuser: bool,
    pub created_at: i64,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username,
            is_superuser: identity.is_superuser,
            created_at: identity.created_at,
        }
    }
}

/// Identity listing row for the user management page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct IdentitySummary {
    pub id: i64,
    pub username: String,
    pub is_superuser: bool,
    pub created_at: i64,
    /// Number of tickets currently assigned to this identity
    pub assigned_tickets: i64,
}

/// Login payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Identity-management action (superuser only)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserAction {
    Create {
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
        #[serde(default)]
        is_superuser: bool,
    },
    Delete {
        user_id: i64,
    },
    ResetPassword {
        user_id: i64,
        #[serde(default)]
        new_password: String,
    },
}
