//! Login throttling
//!
//! Failed and successful attempts count alike: each client gets
//! `login_rate_limit` tries per fixed 60 second window.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use shared::{AppError, ErrorCode};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::core::AppState;
use crate::security_log;

const LOGIN_WINDOW: Duration = Duration::from_secs(60);
/// Windows idle this long are dropped by [`RateLimiter::cleanup`]
const IDLE_RETENTION: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
struct Window {
    opened: Instant,
    hits: u32,
}

/// Fixed-window counters keyed by client address
#[derive(Clone, Default)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one hit for `client`; `false` once it is over `limit` in the current window
    pub async fn hit(&self, client: &str, limit: u32, window: Duration) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let entry = windows.entry(client.to_owned()).or_insert(Window {
            opened: now,
            hits: 0,
        });

        if now.duration_since(entry.opened) >= window {
            *entry = Window {
                opened: now,
                hits: 0,
            };
        }
        entry.hits = entry.hits.saturating_add(1);
        entry.hits <= limit
    }

    pub async fn cleanup(&self) {
        let now = Instant::now();
        self.windows
            .lock()
            .await
            .retain(|_, w| now.duration_since(w.opened) < IDLE_RETENTION);
    }
}

/// Address the limiter keys on.
///
/// The TCP peer address by default. `X-Forwarded-For` is only consulted when
/// `trust_proxy_headers` is set, since any direct client can forge it.
pub fn client_key(request: &Request, trust_proxy_headers: bool) -> String {
    let forwarded = trust_proxy_headers
        .then(|| request.headers().get("x-forwarded-for"))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_owned();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request, state.config.trust_proxy_headers);
    let allowed = state
        .rate_limiter
        .hit(&client, state.config.login_rate_limit, LOGIN_WINDOW)
        .await;

    if !allowed {
        security_log!(WARN, "login_rate_limited", client = %client);
        return AppError::new(ErrorCode::TooManyRequests).into_response();
    }
    next.run(request).await
}
