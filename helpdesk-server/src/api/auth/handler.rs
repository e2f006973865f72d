//! Authentication Handlers

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum_extra::extract::cookie::CookieJar;
use shared::models::{IdentityResponse, LoginRequest};
use shared::{ApiResponse, AppResult};

use crate::auth::session::{logout_cookie, session_cookie, token_from_jar};
use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::services::identities;

/// Check credentials, open a session and set the session cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(CookieJar, Json<ApiResponse<IdentityResponse>>)> {
    let Json(req) = payload?;
    let identity = identities::authenticate(&state, &req.username, &req.password).await?;

    let token = state.sessions.create(&identity);
    let cookie = session_cookie(
        token,
        state.config.is_production(),
        state.sessions.max_age_secs(),
    );

    tracing::info!(user_id = identity.id, username = %identity.username, "User logged in");

    Ok((
        jar.add(cookie),
        Json(ApiResponse::success_with_message(
            "Logged in",
            IdentityResponse::from(identity),
        )),
    ))
}

/// Always succeeds, with or without a session
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    if let Some(token) = token_from_jar(&jar)
        && let Some(session) = state.sessions.remove(&token)
    {
        tracing::info!(user_id = session.identity_id, username = %session.username, "User logged out");
    }

    let mut response = ApiResponse::ok();
    response.message = "Logged out".to_string();
    (
        jar.add(logout_cookie(state.config.is_production())),
        Json(response),
    )
}

pub async fn me(user: CurrentUser) -> Json<ApiResponse<CurrentUser>> {
    Json(ApiResponse::success(user))
}
