//! Identity Management Routes (superuser only)

mod handler;

use axum::{Router, routing::get};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/users", get(handler::list).post(handler::action))
}
