//! JSON envelope shared by every endpoint
//!
//! Success: `{"code": 0, "message": "...", "data": ...}`.
//! Failure: `{"code": <ErrorCode>, "message": "...", "details": {...}}`.

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::success_with_message("OK", data)
    }

    /// Success with a notice for the client to flash
    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            code: Some(ErrorCode::Success.code()),
            message: message.into(),
            data: Some(data),
            details: None,
        }
    }
}

impl ApiResponse<()> {
    /// Success with no payload
    pub fn ok() -> Self {
        Self {
            code: Some(ErrorCode::Success.code()),
            message: "OK".to_string(),
            data: None,
            details: None,
        }
    }

    pub fn failure(
        code: ErrorCode,
        message: impl Into<String>,
        details: Option<HashMap<String, Value>>,
    ) -> Self {
        Self {
            code: Some(code.code()),
            message: message.into(),
            data: None,
            details,
        }
    }
}
