//! Configuration and shared state

pub mod config;
pub mod state;

pub use config::{BoxError, Config};
pub use state::AppState;
