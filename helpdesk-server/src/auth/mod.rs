//! Staff authentication
//!
//! - [`session`]: cookie-backed server-side sessions
//! - [`extractor`]: `CurrentUser` / `Superuser` route guards
//! - [`rate_limit`]: per-IP login throttling

pub mod extractor;
pub mod rate_limit;
pub mod session;

pub use extractor::{CurrentUser, DASHBOARD_ROUTE, LOGIN_ROUTE, Superuser};
pub use rate_limit::{RateLimiter, login_rate_limit};
pub use session::{SESSION_COOKIE, Session, SessionStore};
