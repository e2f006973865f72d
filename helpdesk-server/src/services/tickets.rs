//! Ticket operations
//!
//! Submission, dashboard listing and the staff mutations on a single ticket.

use std::collections::{HashMap, HashSet};

use shared::models::{
    NewTicket, Priority, SubmissionReceipt, Ticket, TicketDetailResponse, TicketDetails,
    TicketFilter, TicketKind, TicketListQuery, TicketStatus,
};
use shared::util::now_millis;
use shared::{AppError, AppResult, ErrorCode, PaginatedResponse};

use crate::core::AppState;
use crate::db::repository::{RepoError, comment, identity, ticket};

/// Image part of a submission, already read from the request
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Text fields of a submission form plus the optional image
#[derive(Debug, Default)]
pub struct SubmissionForm {
    fields: HashMap<String, String>,
    pub image: Option<ImageUpload>,
}

impl SubmissionForm {
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    fn optional(&self, field: &str) -> Option<String> {
        self.fields
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn required(&self, field: &str) -> AppResult<String> {
        self.optional(field).ok_or_else(|| AppError::required(field))
    }

    /// Vehicle-fault submission: vehicle number is optional
    pub fn into_vehicle(self) -> AppResult<(NewTicket, Option<ImageUpload>)> {
        let ticket = NewTicket {
            requester_name: self.required("requester_name")?,
            description: self.required("description")?,
            details: TicketDetails::Vehicle {
                vehicle_type: self.required("vehicle_type")?,
                vehicle_number: self.optional("vehicle_number"),
                anomaly_category: self.required("anomaly_category")?,
            },
        };
        Ok((ticket, self.image))
    }

    /// Technical submission: department is optional, priority defaults to MEDIUM
    pub fn into_technical(self) -> AppResult<(NewTicket, Option<ImageUpload>)> {
        let priority = match self.optional("priority") {
            Some(raw) => raw.parse::<Priority>()?,
            None => Priority::default(),
        };
        let ticket = NewTicket {
            requester_name: self.required("requester_name")?,
            description: self.required("description")?,
            details: TicketDetails::Technical {
                title: self.required("title")?,
                department: self.optional("department"),
                priority,
            },
        };
        Ok((ticket, self.image))
    }
}

fn ticket_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::TicketNotFound, format!("Ticket #{id} not found"))
        .with_detail("ticket_id", id)
}

/// Keep a rejected attachment from failing the submission
async fn store_attachment(state: &AppState, upload: &ImageUpload) -> Option<String> {
    let sanitized = match state.attachments.validate(&upload.file_name, &upload.data) {
        Ok(name) => name,
        Err(reason) => {
            tracing::warn!(
                file_name = %upload.file_name,
                size = upload.data.len(),
                reason = %reason,
                "Attachment dropped"
            );
            return None;
        }
    };

    match state.attachments.store(&sanitized, &upload.data).await {
        Ok(filename) => Some(filename),
        Err(e) => {
            tracing::warn!(file_name = %upload.file_name, error = %e, "Attachment dropped");
            None
        }
    }
}

/// Create a `NEW` ticket from a public submission
pub async fn submit(
    state: &AppState,
    data: NewTicket,
    image: Option<ImageUpload>,
) -> AppResult<SubmissionReceipt> {
    let mut attachment_dropped = false;
    let mut stored = None;
    if let Some(upload) = &image {
        stored = store_attachment(state, upload).await;
        attachment_dropped = stored.is_none();
    }

    let id = match ticket::create(&state.pool, &data, stored.as_deref()).await {
        Ok(id) => id,
        Err(e) => {
            if let Some(filename) = &stored
                && let Err(rm) = state.attachments.remove(filename).await
            {
                tracing::error!(filename = %filename, error = %rm, "Failed to remove attachment of rejected ticket");
            }
            return Err(e.into());
        }
    };

    let kind = data.details.kind();
    tracing::info!(
        ticket_id = id,
        kind = %kind,
        attachment = stored.is_some(),
        "Ticket submitted"
    );

    Ok(SubmissionReceipt {
        id,
        kind,
        status: TicketStatus::New,
        attachment_dropped,
    })
}

pub async fn get(state: &AppState, id: i64) -> AppResult<Ticket> {
    ticket::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ticket_not_found(id))
}

/// Ticket with its comments and the assignable staff
pub async fn detail(state: &AppState, id: i64) -> AppResult<TicketDetailResponse> {
    let ticket = get(state, id).await?;
    let comments = comment::find_by_ticket(&state.pool, id).await?;
    let staff = identity::find_all(&state.pool).await?;

    Ok(TicketDetailResponse {
        ticket,
        comments,
        staff,
    })
}

/// Dashboard listing
pub async fn list(state: &AppState, query: &TicketListQuery) -> AppResult<PaginatedResponse<Ticket>> {
    let filter = TicketFilter::from_query(query)?;
    let page_size = state.config.page_size;
    let (tickets, total) = ticket::find_page(&state.pool, &filter, page_size).await?;

    Ok(PaginatedResponse::new(tickets, total, filter.page, page_size))
}

pub async fn update_status(state: &AppState, id: i64, status: &str) -> AppResult<Ticket> {
    let to = status.parse::<TicketStatus>()?;
    let current = get(state, id).await?;
    let next = current.lifecycle().transition(to, now_millis());

    ticket::update_lifecycle(&state.pool, id, &next).await?;
    tracing::info!(
        ticket_id = id,
        from = %current.status,
        to = %to,
        "Ticket status updated"
    );

    get(state, id).await
}

/// Set or clear the owner
pub async fn assign(state: &AppState, id: i64, assignee: Option<i64>) -> AppResult<Ticket> {
    get(state, id).await?;

    if let Some(identity_id) = assignee
        && !identity::exists(&state.pool, identity_id).await?
    {
        return Err(AppError::with_message(
            ErrorCode::IdentityNotFound,
            format!("User #{identity_id} not found"),
        )
        .with_detail("user_id", identity_id));
    }

    ticket::set_assignee(&state.pool, id, assignee).await?;
    tracing::info!(ticket_id = id, assignee = ?assignee, "Ticket assignment updated");

    get(state, id).await
}

pub async fn add_comment(
    state: &AppState,
    id: i64,
    author_name: &str,
    body: &str,
) -> AppResult<shared::models::Comment> {
    let author_name = author_name.trim();
    let body = body.trim();
    if author_name.is_empty() {
        return Err(AppError::required("author_name"));
    }
    if body.is_empty() {
        return Err(AppError::required("comment_body"));
    }

    get(state, id).await?;
    let created = comment::create(&state.pool, id, author_name, body).await?;
    tracing::info!(ticket_id = id, comment_id = created.id, "Comment added");

    Ok(created)
}

/// Technical tickets only
pub async fn update_priority(state: &AppState, id: i64, priority: &str) -> AppResult<Ticket> {
    let current = get(state, id).await?;
    if current.kind() != TicketKind::Technical {
        return Err(AppError::new(ErrorCode::PriorityNotApplicable).with_detail("ticket_id", id));
    }
    let priority = priority.parse::<Priority>()?;

    match ticket::set_priority(&state.pool, id, priority).await {
        Ok(()) => {}
        // Deleted between the read and the write
        Err(RepoError::NotFound(_)) => return Err(ticket_not_found(id)),
        Err(e) => return Err(e.into()),
    }
    tracing::info!(ticket_id = id, priority = %priority, "Ticket priority updated");

    get(state, id).await
}

/// Delete comments, attachment and ticket in one transaction
pub async fn delete(state: &AppState, id: i64) -> AppResult<()> {
    let current = get(state, id).await?;

    let mut tx = state
        .pool
        .begin()
        .await
        .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

    let comments = comment::delete_by_ticket(&mut *tx, id).await?;

    // Missing files are tolerated; other IO errors roll the transaction back
    if let Some(filename) = &current.image_filename {
        state.attachments.remove(filename).await?;
    }

    if !ticket::delete(&mut *tx, id).await? {
        return Err(ticket_not_found(id));
    }

    tx.commit()
        .await
        .map_err(|e| AppError::database(format!("Failed to commit ticket deletion: {e}")))?;

    tracing::info!(ticket_id = id, comments, "Ticket deleted");
    Ok(())
}

/// Remove upload files that no ticket references
pub async fn sweep_orphan_attachments(state: &AppState) -> AppResult<usize> {
    let referenced: HashSet<String> = ticket::find_image_filenames(&state.pool)
        .await?
        .into_iter()
        .collect();
    let removed = state.attachments.sweep_orphans(&referenced).await?;
    if removed > 0 {
        tracing::info!(count = removed, "Orphan attachments cleaned up");
    }
    Ok(removed)
}
