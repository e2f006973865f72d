//! Attachment download (staff only)

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::{Router, routing::get};
use http::header;
use shared::AppResult;

use crate::auth::CurrentUser;
use crate::core::AppState;

async fn serve_attachment(
    State(state): State<AppState>,
    _user: CurrentUser,
    filename: Result<Path<String>, PathRejection>,
) -> AppResult<impl IntoResponse> {
    let Path(filename) = filename?;
    let content = state.attachments.read(&filename).await?;
    let mime = mime_guess::from_path(&filename).first_or_octet_stream();

    Ok(([(header::CONTENT_TYPE, mime.to_string())], content))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/attachments/{filename}", get(serve_attachment))
}
