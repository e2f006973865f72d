//! Public submission handlers

use axum::Json;
use axum::extract::{Multipart, State};
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use shared::models::{ANOMALY_CATEGORIES, SubmissionReceipt};
use shared::{ApiResponse, AppResult};

use crate::core::AppState;
use crate::services::{ImageUpload, SubmissionForm, tickets};

/// Multipart field carrying the optional image
const IMAGE_FIELD: &str = "image";

pub async fn anomaly_categories() -> Json<ApiResponse<Vec<&'static str>>> {
    Json(ApiResponse::success(ANOMALY_CATEGORIES.to_vec()))
}

/// Read at most `limit + 1` bytes so oversized files are detected without buffering them
async fn read_capped(mut field: Field<'_>, limit: usize) -> Result<Vec<u8>, MultipartError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        let room = (limit + 1).saturating_sub(data.len());
        data.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if data.len() > limit {
            break;
        }
    }
    Ok(data)
}

async fn read_form(state: &AppState, mut multipart: Multipart) -> AppResult<SubmissionForm> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == IMAGE_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = read_capped(field, state.attachments.max_bytes()).await?;
            // An empty file input is "no image", not a rejected one
            if file_name.is_empty() && data.is_empty() {
                continue;
            }
            form.image = Some(ImageUpload { file_name, data });
        } else {
            form.insert(name, field.text().await?);
        }
    }

    Ok(form)
}

pub async fn submit_vehicle(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ApiResponse<SubmissionReceipt>>> {
    let (ticket, image) = read_form(&state, multipart?).await?.into_vehicle()?;
    let receipt = tickets::submit(&state, ticket, image).await?;
    Ok(Json(ApiResponse::success_with_message(
        format!("Ticket #{} created", receipt.id),
        receipt,
    )))
}

pub async fn submit_technical(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ApiResponse<SubmissionReceipt>>> {
    let (ticket, image) = read_form(&state, multipart?).await?.into_technical()?;
    let receipt = tickets::submit(&state, ticket, image).await?;
    Ok(Json(ApiResponse::success_with_message(
        format!("Ticket #{} created", receipt.id),
        receipt,
    )))
}
