//! Numeric error codes carried in every failure envelope
//!
//! The leading digit groups codes by area: 0 general, 1 auth, 2 access,
//! 3 tickets, 4 identities, 9 server-side faults.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code, serialized as its bare `u16`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    Success = 0,
    ValidationFailed = 2,
    NotFound = 3,
    AlreadyExists = 4,
    /// Malformed body, path or query string
    InvalidRequest = 5,
    RequiredField = 7,

    NotAuthenticated = 1001,
    InvalidCredentials = 1002,
    /// Cookie present but the session is unknown or expired
    SessionExpired = 1005,
    TooManyRequests = 1008,

    AdminRequired = 2003,
    CannotDeleteSelf = 2006,

    TicketNotFound = 3001,
    InvalidStatus = 3002,
    InvalidPriority = 3003,
    /// Priority edits on a vehicle ticket
    PriorityNotApplicable = 3004,
    AttachmentNotFound = 3005,

    IdentityNotFound = 4001,
    UsernameExists = 4002,

    InternalError = 9001,
    DatabaseError = 9002,
    StorageError = 9401,
}

const ALL: [ErrorCode; 22] = [
    ErrorCode::Success,
    ErrorCode::ValidationFailed,
    ErrorCode::NotFound,
    ErrorCode::AlreadyExists,
    ErrorCode::InvalidRequest,
    ErrorCode::RequiredField,
    ErrorCode::NotAuthenticated,
    ErrorCode::InvalidCredentials,
    ErrorCode::SessionExpired,
    ErrorCode::TooManyRequests,
    ErrorCode::AdminRequired,
    ErrorCode::CannotDeleteSelf,
    ErrorCode::TicketNotFound,
    ErrorCode::InvalidStatus,
    ErrorCode::InvalidPriority,
    ErrorCode::PriorityNotApplicable,
    ErrorCode::AttachmentNotFound,
    ErrorCode::IdentityNotFound,
    ErrorCode::UsernameExists,
    ErrorCode::InternalError,
    ErrorCode::DatabaseError,
    ErrorCode::StorageError,
];

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Server-side faults: logged in full, reported to clients generically
    pub const fn is_system(&self) -> bool {
        self.code() >= 9000
    }

    /// Default notice shown to the client
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "OK",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",

            ErrorCode::NotAuthenticated => "You must log in to access this page",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::SessionExpired => "Your session has expired, please log in again",
            ErrorCode::TooManyRequests => "Too many login attempts, try again later",

            ErrorCode::AdminRequired => "Permission denied: reserved for administrators",
            ErrorCode::CannotDeleteSelf => "You cannot delete your own account",

            ErrorCode::TicketNotFound => "Ticket not found",
            ErrorCode::InvalidStatus => "Invalid status",
            ErrorCode::InvalidPriority => "Invalid priority",
            ErrorCode::PriorityNotApplicable => {
                "Priority can only be changed on technical tickets"
            }
            ErrorCode::AttachmentNotFound => "Attachment not found",

            ErrorCode::IdentityNotFound => "User not found",
            ErrorCode::UsernameExists => "Username already exists",

            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::StorageError => "Attachment storage error",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A `u16` that names no [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown error code {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ALL.iter()
            .copied()
            .find(|code| code.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
