//! Error codes, the application error and the response envelope
//!
//! ```
//! use shared::error::{ApiResponse, AppError, ErrorCode};
//!
//! let err = AppError::required("description");
//! assert_eq!(err.code, ErrorCode::RequiredField);
//!
//! let ok = ApiResponse::success(vec![1, 2, 3]);
//! assert_eq!(ok.code, Some(0));
//! ```

mod codes;
mod http;
mod response;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use response::ApiResponse;
pub use types::{AppError, AppResult};
