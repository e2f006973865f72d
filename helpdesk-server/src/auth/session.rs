//! Server-side sessions carried by an HttpOnly cookie

use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use dashmap::DashMap;
use serde::Serialize;
use shared::models::Identity;
use shared::util::now_millis;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "helpdesk_session";

/// Data held for a logged-in identity
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub identity_id: i64,
    pub username: String,
    pub is_superuser: bool,
    /// Epoch millis
    pub created_at: i64,
}

/// In-memory session map keyed by random token
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Session>>,
    max_age_secs: i64,
}

impl SessionStore {
    pub fn new(max_age_secs: i64) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            max_age_secs,
        }
    }

    pub fn max_age_secs(&self) -> i64 {
        self.max_age_secs
    }

    /// Open a session for `identity` and return its token
    pub fn create(&self, identity: &Identity) -> String {
        let token = Uuid::new_v4().to_string();
        self.sessions.insert(
            token.clone(),
            Session {
                identity_id: identity.id,
                username: identity.username.clone(),
                is_superuser: identity.is_superuser,
                created_at: now_millis(),
            },
        );
        token
    }

    fn is_expired(&self, session: &Session, now: i64) -> bool {
        now - session.created_at >= self.max_age_secs.saturating_mul(1000)
    }

    /// Look up a live session; an expired one is dropped on the way
    pub fn get(&self, token: &str) -> Option<Session> {
        let session = self.sessions.get(token)?.clone();
        if self.is_expired(&session, now_millis()) {
            self.sessions.remove(token);
            return None;
        }
        Some(session)
    }

    pub fn remove(&self, token: &str) -> Option<Session> {
        self.sessions.remove(token).map(|(_, session)| session)
    }

    /// Drop every session belonging to `identity_id`
    pub fn revoke_identity(&self, identity_id: i64) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.identity_id != identity_id);
        before - self.sessions.len()
    }

    /// Purge expired sessions, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let now = now_millis();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !self.is_expired(session, now));
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

pub fn session_cookie(token: String, secure: bool, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_secs))
        .path("/")
        .build()
}

pub fn logout_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(0))
        .path("/")
        .build()
}

/// Session token from the request cookies, if any
pub fn token_from_jar(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
