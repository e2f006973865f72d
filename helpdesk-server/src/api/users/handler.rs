//! Identity Management Handlers

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde_json::{Value, json};
use shared::models::{IdentitySummary, UserAction};
use shared::{ApiResponse, AppResult};

use crate::auth::Superuser;
use crate::core::AppState;
use crate::services::identities;

pub async fn list(
    State(state): State<AppState>,
    _admin: Superuser,
) -> AppResult<Json<ApiResponse<Vec<IdentitySummary>>>> {
    let users = identities::list_with_counts(&state).await?;
    Ok(Json(ApiResponse::success(users)))
}

pub async fn action(
    State(state): State<AppState>,
    Superuser(admin): Superuser,
    payload: Result<Json<UserAction>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let Json(action) = payload?;

    let response = match action {
        UserAction::Create {
            username,
            password,
            is_superuser,
        } => {
            let created = identities::create(&state, &username, &password, is_superuser).await?;
            ApiResponse::success_with_message("User created", json!(created))
        }
        UserAction::Delete { user_id } => {
            identities::delete(&state, admin.id, user_id).await?;
            ApiResponse::success_with_message("User deleted", json!({ "id": user_id }))
        }
        UserAction::ResetPassword {
            user_id,
            new_password,
        } => {
            identities::reset_password(&state, user_id, &new_password).await?;
            ApiResponse::success_with_message("Password updated", json!({ "id": user_id }))
        }
    };

    Ok(Json(response))
}
