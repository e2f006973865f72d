//! HTTP API
//!
//! - [`health`]: liveness check
//! - [`tickets`]: public ticket submission
//! - [`auth`]: login, logout, current identity
//! - [`admin`]: staff dashboard and ticket mutations
//! - [`attachments`]: staff attachment download
//! - [`users`]: superuser identity management

pub mod admin;
pub mod attachments;
pub mod auth;
pub mod health;
pub mod tickets;
pub mod users;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::trace::TraceLayer;

use crate::core::AppState;

/// Create the combined router with middleware and state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(tickets::router())
        .merge(auth::router(&state))
        .merge(admin::router())
        .merge(attachments::router())
        .merge(users::router())
        .layer(DefaultBodyLimit::max(state.config.max_request_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
