//! Public Ticket Routes
//!
//! Anyone can submit a ticket; no session is required.

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/tickets/anomaly-categories",
            get(handler::anomaly_categories),
        )
        .route("/api/tickets/vehicle", post(handler::submit_vehicle))
        .route("/api/tickets/technical", post(handler::submit_technical))
}
