//! Session extractors
//!
//! `CurrentUser` guards staff routes and `Superuser` guards identity
//! management. Both run before the handler body and reject with a notice
//! plus a `redirect` detail.

use axum::extract::FromRequestParts;
use axum_extra::extract::cookie::CookieJar;
use http::request::Parts;
use serde::Serialize;
use shared::{AppError, ErrorCode};

use crate::auth::session::token_from_jar;
use crate::core::AppState;
use crate::db::repository::identity;
use crate::security_log;

/// Where an unauthenticated client is sent
pub const LOGIN_ROUTE: &str = "/api/auth/login";
/// Where an authenticated but unprivileged client is sent
pub const DASHBOARD_ROUTE: &str = "/api/admin/tickets";

/// Authenticated staff identity, re-read from the database on each request
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub is_superuser: bool,
}

/// Authenticated identity holding the superuser flag
#[derive(Debug, Clone)]
pub struct Superuser(pub CurrentUser);

fn login_required() -> AppError {
    AppError::not_authenticated().with_redirect(LOGIN_ROUTE)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = token_from_jar(&jar) else {
            security_log!(WARN, "session_missing", uri = ?parts.uri);
            return Err(login_required());
        };

        let Some(session) = state.sessions.get(&token) else {
            security_log!(WARN, "session_invalid", uri = ?parts.uri);
            return Err(AppError::new(ErrorCode::SessionExpired).with_redirect(LOGIN_ROUTE));
        };

        // Deleted identities lose access immediately
        let Some(found) = identity::find_by_id(&state.pool, session.identity_id).await? else {
            state.sessions.remove(&token);
            security_log!(
                WARN,
                "session_identity_gone",
                identity_id = session.identity_id,
                uri = ?parts.uri
            );
            return Err(login_required());
        };

        let user = CurrentUser {
            id: found.id,
            username: found.username,
            is_superuser: found.is_superuser,
        };
        parts.extensions.insert(user.clone());

        Ok(user)
    }
}

impl FromRequestParts<AppState> for Superuser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_superuser {
            security_log!(
                WARN,
                "permission_denied",
                user_id = user.id,
                username = %user.username,
                uri = ?parts.uri
            );
            return Err(AppError::new(ErrorCode::AdminRequired).with_redirect(DASHBOARD_ROUTE));
        }

        Ok(Superuser(user))
    }
}
