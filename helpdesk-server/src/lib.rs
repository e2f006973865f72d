//! Helpdesk Server
//!
//! Ticket intake for vehicle faults and technical issues, with a staff
//! dashboard for triage, assignment, comments and resolution.
//!
//! # Modules
//!
//! - [`core`]: configuration and shared state
//! - [`db`]: SQLite pool, migrations and repositories
//! - [`attachments`]: image validation and storage
//! - [`auth`]: sessions, route guards, login throttling
//! - [`services`]: ticket and identity operations
//! - [`api`]: HTTP routes
//! - [`utils`]: logging and password hashing

pub mod api;
pub mod attachments;
pub mod auth;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

pub use api::create_router;
pub use core::{AppState, BoxError, Config};
