pub mod logger;
pub mod password;

pub use logger::{cleanup_old_logs, init_logger};
pub use password::{hash_password, verify_password};
