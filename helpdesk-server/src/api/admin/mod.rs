//! Staff Routes
//!
//! Dashboard, ticket detail and mutations, assignee list. Every handler
//! takes a [`CurrentUser`](crate::auth::CurrentUser) so the session is
//! checked before the body runs.

mod handler;

use axum::{Router, routing::get};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/tickets", get(handler::list_tickets))
        .route(
            "/api/admin/tickets/{id}",
            get(handler::ticket_detail).post(handler::ticket_action),
        )
        .route("/api/admin/staff", get(handler::list_staff))
}
