//! The application error

use super::codes::ErrorCode;
use super::response::ApiResponse;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Error returned by every fallible operation that reaches a client.
///
/// `details` carries structured context such as the offending `field`
/// or a `redirect` route for the login and permission guards.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<HashMap<String, Value>>,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Error carrying the code's default notice
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Route the client should be sent to
    pub fn with_redirect(self, route: &str) -> Self {
        self.with_detail("redirect", route)
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// A required form or JSON field was blank or absent
    pub fn required(field: &str) -> Self {
        Self::with_message(ErrorCode::RequiredField, format!("{} is required", field))
            .with_detail("field", field)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    /// Same notice whether the username or the password was wrong
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::StorageError, msg)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();

        if self.code.is_system() {
            tracing::error!(code = %self.code, message = %self.message, "Request failed");
            let body = ApiResponse::<()>::failure(self.code, self.code.message(), None);
            return (status, axum::Json(body)).into_response();
        }

        let body = ApiResponse::<()>::failure(self.code, self.message, self.details);
        (status, axum::Json(body)).into_response()
    }
}

// Extractor rejections share the failure envelope

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::invalid_request(format!("Invalid JSON body: {}", e.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(e: PathRejection) -> Self {
        AppError::invalid_request(format!("Invalid path parameter: {}", e.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        AppError::invalid_request(format!("Invalid query string: {}", e.body_text()))
    }
}

impl From<MultipartRejection> for AppError {
    fn from(e: MultipartRejection) -> Self {
        AppError::invalid_request(format!("Expected a multipart form: {}", e.body_text()))
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::invalid_request(format!("Multipart error: {}", e.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_new_uses_default_notice() {
        let err = AppError::new(ErrorCode::PriorityNotApplicable);
        assert_eq!(
            err.to_string(),
            "Priority can only be changed on technical tickets"
        );
        assert!(err.details.is_none());
    }

    #[test]
    fn test_required_names_the_field() {
        let err = AppError::required("requester_name");
        assert_eq!(err.code, ErrorCode::RequiredField);
        assert_eq!(err.message, "requester_name is required");
        assert_eq!(err.details.unwrap()["field"], "requester_name");
    }

    #[test]
    fn test_redirect_detail() {
        let err = AppError::not_authenticated().with_redirect("/api/auth/login");
        assert_eq!(err.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.details.unwrap()["redirect"], "/api/auth/login");
    }

    #[tokio::test]
    async fn test_client_error_keeps_message_and_details() {
        let response = AppError::with_message(ErrorCode::TicketNotFound, "Ticket #7 not found")
            .with_detail("ticket_id", 7)
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["code"], 3001);
        assert_eq!(body["message"], "Ticket #7 not found");
        assert_eq!(body["details"]["ticket_id"], 7);
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_system_error_is_masked() {
        let response = AppError::database("no such table: tickets").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["code"], 9002);
        assert_eq!(body["message"], "Database error");
    }
}
