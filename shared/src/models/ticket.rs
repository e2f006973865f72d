//! Ticket Model
//!
//! A ticket is a common envelope (status, timestamps, requester, attachment,
//! owner) plus variant-specific details. The variant is fixed at creation.

use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{Comment, IdentityResponse};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Anomaly categories offered to vehicle-fault submitters
///
/// Submissions accept any non-empty text; this list only feeds the form.
pub const ANOMALY_CATEGORIES: [&str; 11] = [
    "Livello Olio/Liquidi",
    "Perdite Liquidi",
    "Pneumatici",
    "Carrozzeria",
    "Spie/Allarmi",
    "Dispositivi Segnalazione",
    "Freni/Sterzo/Cambio",
    "Braccio/Spreader",
    "Rumori Insoliti",
    "Incidenti/Danni",
    "Altri Problemi",
];

/// Ticket variant discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum TicketKind {
    Vehicle,
    Technical,
}

impl TicketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketKind::Vehicle => "VEHICLE",
            TicketKind::Technical => "TECHNICAL",
        }
    }
}

impl std::fmt::Display for TicketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ticket lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum TicketStatus {
    #[default]
    New,
    InProgress,
    Resolved,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "NEW",
            TicketStatus::InProgress => "IN_PROGRESS",
            TicketStatus::Resolved => "RESOLVED",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "NEW" => Ok(TicketStatus::New),
            "IN_PROGRESS" => Ok(TicketStatus::InProgress),
            "RESOLVED" => Ok(TicketStatus::Resolved),
            other => Err(AppError::with_message(
                ErrorCode::InvalidStatus,
                format!("Invalid status: {}", other),
            )
            .with_detail("allowed", "NEW, IN_PROGRESS, RESOLVED")),
        }
    }
}

/// Technical ticket priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            other => Err(AppError::with_message(
                ErrorCode::InvalidPriority,
                format!("Invalid priority: {}", other),
            )
            .with_detail("allowed", "LOW, MEDIUM, HIGH")),
        }
    }
}

// ==================== Lifecycle ====================

/// Status plus the timestamps the status machine maintains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    pub status: TicketStatus,
    pub started_at: Option<i64>,
    pub closed_at: Option<i64>,
}

impl Lifecycle {
    /// Apply a status change at time `now`.
    ///
    /// Any state may move to any other state. `started_at` is stamped the
    /// first time the ticket leaves `NEW` for `IN_PROGRESS`; `closed_at` is
    /// re-stamped every time the ticket enters `RESOLVED`.
    pub fn transition(self, to: TicketStatus, now: i64) -> Self {
        let mut next = Lifecycle { status: to, ..self };

        if self.status == TicketStatus::New
            && to == TicketStatus::InProgress
            && self.started_at.is_none()
        {
            next.started_at = Some(now);
        } else if to == TicketStatus::Resolved && self.status != TicketStatus::Resolved {
            next.closed_at = Some(now);
        }

        next
    }
}

// ==================== Records ====================

/// Variant-specific ticket fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketDetails {
    Vehicle {
        vehicle_type: String,
        vehicle_number: Option<String>,
        anomaly_category: String,
    },
    Technical {
        title: String,
        department: Option<String>,
        priority: Priority,
    },
}

impl TicketDetails {
    pub fn kind(&self) -> TicketKind {
        match self {
            TicketDetails::Vehicle { .. } => TicketKind::Vehicle,
            TicketDetails::Technical { .. } => TicketKind::Technical,
        }
    }
}

/// Ticket as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub status: TicketStatus,
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub closed_at: Option<i64>,
    pub requester_name: String,
    pub description: String,
    pub image_filename: Option<String>,
    pub assigned_to_id: Option<i64>,
    /// Username of the assignee, resolved at read time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to_username: Option<String>,
    #[serde(flatten)]
    pub details: TicketDetails,
}

impl Ticket {
    pub fn kind(&self) -> TicketKind {
        self.details.kind()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle {
            status: self.status,
            started_at: self.started_at,
            closed_at: self.closed_at,
        }
    }
}

/// Flat ticket row (one column per field of either variant)
#[derive(Debug, Clone)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TicketRow {
    pub id: i64,
    pub kind: TicketKind,
    pub status: TicketStatus,
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub closed_at: Option<i64>,
    pub requester_name: String,
    pub description: String,
    pub image_filename: Option<String>,
    pub assigned_to_id: Option<i64>,
    pub assigned_to_username: Option<String>,
    pub vehicle_type: Option<String>,
    pub vehicle_number: Option<String>,
    pub anomaly_category: Option<String>,
    pub title: Option<String>,
    pub department: Option<String>,
    pub priority: Option<Priority>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = AppError;

    fn try_from(row: TicketRow) -> AppResult<Self> {
        let id = row.id;
        let missing = |col: &str| AppError::internal(format!("ticket {} has no {}", id, col));

        let details = match row.kind {
            TicketKind::Vehicle => TicketDetails::Vehicle {
                vehicle_type: row.vehicle_type.ok_or_else(|| missing("vehicle_type"))?,
                vehicle_number: row.vehicle_number,
                anomaly_category: row
                    .anomaly_category
                    .ok_or_else(|| missing("anomaly_category"))?,
            },
            TicketKind::Technical => TicketDetails::Technical {
                title: row.title.ok_or_else(|| missing("title"))?,
                department: row.department,
                priority: row.priority.ok_or_else(|| missing("priority"))?,
            },
        };

        Ok(Ticket {
            id,
            status: row.status,
            created_at: row.created_at,
            started_at: row.started_at,
            closed_at: row.closed_at,
            requester_name: row.requester_name,
            description: row.description,
            image_filename: row.image_filename,
            assigned_to_id: row.assigned_to_id,
            assigned_to_username: row.assigned_to_username,
            details,
        })
    }
}

/// Validated submission ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub requester_name: String,
    pub description: String,
    pub details: TicketDetails,
}

/// Response to a public submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub id: i64,
    pub kind: TicketKind,
    pub status: TicketStatus,
    /// An image was sent but rejected; the ticket exists without it
    pub attachment_dropped: bool,
}

/// Ticket detail page payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetailResponse {
    pub ticket: Ticket,
    /// Newest first
    pub comments: Vec<Comment>,
    /// Identities offered as assignees
    pub staff: Vec<IdentityResponse>,
}

// ==================== Staff actions ====================

/// Assignee value sent by the client: an identity id, or `"none"`/empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssigneeInput {
    Id(i64),
    Text(String),
}

impl AssigneeInput {
    /// Resolve to the owner id to store (`None` means unassigned)
    pub fn resolve(&self) -> AppResult<Option<i64>> {
        match self {
            AssigneeInput::Id(id) => Ok(Some(*id)),
            AssigneeInput::Text(text) => {
                let text = text.trim();
                if text.is_empty() || text == "none" {
                    return Ok(None);
                }
                text.parse::<i64>().map(Some).map_err(|_| {
                    AppError::validation(format!("Invalid assignee: {}", text))
                        .with_detail("field", "assigned_to_id")
                })
            }
        }
    }
}

/// Mutation requested on the ticket detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TicketAction {
    UpdateStatus {
        status: String,
    },
    Assign {
        #[serde(default)]
        assigned_to_id: Option<AssigneeInput>,
    },
    Delete,
    AddComment {
        #[serde(default)]
        author_name: String,
        #[serde(default)]
        comment_body: String,
    },
    UpdatePriority {
        priority: String,
    },
}

// ==================== Listing ====================

/// Raw dashboard query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assigned: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

/// Owner filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssigneeFilter {
    #[default]
    Any,
    Unassigned,
    Identity(i64),
}

/// Parsed dashboard filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketFilter {
    pub search: Option<String>,
    pub status: Option<TicketStatus>,
    pub assignee: AssigneeFilter,
    /// 1-based page number
    pub page: u32,
}

impl Default for TicketFilter {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            assignee: AssigneeFilter::Any,
            page: 1,
        }
    }
}

impl TicketFilter {
    /// Parse the raw query. Blank values mean "no filter"; a bad page
    /// number falls back to page 1.
    pub fn from_query(query: &TicketListQuery) -> AppResult<Self> {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let status = non_blank(&query.status)
            .map(|s| s.parse::<TicketStatus>())
            .transpose()?;

        let assignee = match non_blank(&query.assigned) {
            None => AssigneeFilter::Any,
            Some(v) if v == "unassigned" => AssigneeFilter::Unassigned,
            Some(v) => AssigneeFilter::Identity(v.parse::<i64>().map_err(|_| {
                AppError::validation(format!("Invalid assignee filter: {}", v))
                    .with_detail("field", "assigned")
            })?),
        };

        let page = query
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);

        Ok(Self {
            search: non_blank(&query.search),
            status,
            assignee,
            page,
        })
    }

    /// Ticket id to match exactly when the search term is all digits
    pub fn search_id(&self) -> Option<i64> {
        self.search
            .as_deref()
            .filter(|s| s.chars().all(|c| c.is_ascii_digit()))
            .and_then(|s| s.parse().ok())
    }
}
