//! Authentication Routes

mod handler;

use axum::{Router, middleware, routing::get, routing::post};

use crate::auth::login_rate_limit;
use crate::core::AppState;

/// - /api/auth/login: public, rate-limited per IP
/// - /api/auth/logout: public, clears whatever session the cookie names
/// - /api/auth/me: staff session required
pub fn router(state: &AppState) -> Router<AppState> {
    let login = Router::new()
        .route("/api/auth/login", post(handler::login))
        .layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    Router::new()
        .merge(login)
        .route("/api/auth/logout", post(handler::logout))
        .route("/api/auth/me", get(handler::me))
}
