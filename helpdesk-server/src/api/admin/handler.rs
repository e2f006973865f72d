//! Staff Handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use serde_json::{Value, json};
use shared::models::{
    IdentityResponse, Ticket, TicketAction, TicketDetailResponse, TicketListQuery,
};
use shared::{ApiResponse, AppResult, PaginatedResponse};

use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::services::{identities, tickets};

/// GET /api/admin/tickets?search=&status=&assigned=&page=
pub async fn list_tickets(
    State(state): State<AppState>,
    _user: CurrentUser,
    query: Result<Query<TicketListQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Ticket>>>> {
    let Query(query) = query?;
    let page = tickets::list(&state, &query).await?;
    Ok(Json(ApiResponse::success(page)))
}

pub async fn ticket_detail(
    State(state): State<AppState>,
    _user: CurrentUser,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<ApiResponse<TicketDetailResponse>>> {
    let Path(id) = id?;
    let detail = tickets::detail(&state, id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// POST /api/admin/tickets/{id}: one mutation per request, chosen by `action`
pub async fn ticket_action(
    State(state): State<AppState>,
    user: CurrentUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TicketAction>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let Path(id) = id?;
    let Json(action) = payload?;

    let response = match action {
        TicketAction::UpdateStatus { status } => {
            let ticket = tickets::update_status(&state, id, &status).await?;
            ApiResponse::success_with_message("Status updated", json!(ticket))
        }
        TicketAction::Assign { assigned_to_id } => {
            let assignee = match assigned_to_id {
                Some(input) => input.resolve()?,
                None => None,
            };
            let ticket = tickets::assign(&state, id, assignee).await?;
            ApiResponse::success_with_message("Assignment updated", json!(ticket))
        }
        TicketAction::Delete => {
            tickets::delete(&state, id).await?;
            tracing::info!(ticket_id = id, user_id = user.id, "Ticket deleted by staff");
            ApiResponse::success_with_message("Ticket deleted", json!({ "id": id }))
        }
        TicketAction::AddComment {
            author_name,
            comment_body,
        } => {
            let comment = tickets::add_comment(&state, id, &author_name, &comment_body).await?;
            ApiResponse::success_with_message("Comment added", json!(comment))
        }
        TicketAction::UpdatePriority { priority } => {
            let ticket = tickets::update_priority(&state, id, &priority).await?;
            ApiResponse::success_with_message("Priority updated", json!(ticket))
        }
    };

    Ok(Json(response))
}

pub async fn list_staff(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<IdentityResponse>>>> {
    let staff = identities::list_staff(&state).await?;
    Ok(Json(ApiResponse::success(staff)))
}
