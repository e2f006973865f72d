//! Server configuration

use std::path::{Path, PathBuf};
use std::str::FromStr;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

const MIB: usize = 1024 * 1024;

/// Helpdesk server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    /// HTTP listen port
    pub http_port: u16,
    /// SQLite database file
    pub database_path: String,
    /// Directory holding ticket attachments
    pub upload_dir: PathBuf,
    /// Largest accepted attachment
    pub max_upload_bytes: usize,
    /// Largest accepted request body (multipart included)
    pub max_request_bytes: usize,
    /// Tickets per dashboard page
    pub page_size: u32,
    /// Session lifetime
    pub session_max_age_secs: i64,
    /// Login attempts allowed per IP per minute
    pub login_rate_limit: u32,
    /// Superuser ensured at startup
    pub bootstrap_admin_username: String,
    pub bootstrap_admin_password: String,
    /// Remove attachment files no ticket references at startup
    pub sweep_orphans_on_start: bool,
    /// Key the login limiter on `X-Forwarded-For` (only behind a reverse proxy)
    pub trust_proxy_headers: bool,
    pub log_level: String,
    /// Log directory (console only when unset)
    pub log_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".into(),
            http_port: 5000,
            database_path: "tickets.db".into(),
            upload_dir: PathBuf::from("static/uploads"),
            max_upload_bytes: 16 * MIB,
            max_request_bytes: 64 * MIB,
            page_size: 50,
            session_max_age_secs: 24 * 60 * 60,
            login_rate_limit: 10,
            bootstrap_admin_username: "admin".into(),
            bootstrap_admin_password: "admin123".into(),
            sweep_orphans_on_start: true,
            trust_proxy_headers: false,
            log_level: "info".into(),
            log_dir: None,
        }
    }
}

impl Config {
    /// Secret env var; only development may fall back to `dev_default`
    fn require_secret(&self, name: &str, dev_default: &str) -> Result<String, BoxError> {
        let environment = &self.environment;
        match std::env::var(name) {
            Ok(v) if !v.is_empty() => Ok(v),
            Ok(_) if !self.is_development() => {
                Err(format!("{name} must not be empty in {environment} environment").into())
            }
            Err(_) if !self.is_development() => {
                Err(format!("{name} must be set in {environment} environment").into())
            }
            _ => Ok(dev_default.to_string()),
        }
    }

    /// Parse an optional env var, failing on a value that does not parse
    fn parsed<T: FromStr>(name: &str, default: T) -> Result<T, BoxError> {
        match std::env::var(name) {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse()
                .map_err(|_| format!("{name} has an invalid value: {raw}").into()),
            _ => Ok(default),
        }
    }

    fn flag(name: &str, default: bool) -> Result<bool, BoxError> {
        match std::env::var(name) {
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                "" => Ok(default),
                _ => Err(format!("{name} must be a boolean, got: {raw}").into()),
            },
            Err(_) => Ok(default),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let defaults = Self::default();
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let mut config = Self {
            http_port: Self::parsed("HTTP_PORT", defaults.http_port)?,
            database_path: std::env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: Self::parsed("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            max_request_bytes: Self::parsed("MAX_REQUEST_BYTES", defaults.max_request_bytes)?,
            page_size: Self::parsed("PAGE_SIZE", defaults.page_size)?,
            session_max_age_secs: Self::parsed(
                "SESSION_MAX_AGE_SECS",
                defaults.session_max_age_secs,
            )?,
            login_rate_limit: Self::parsed("LOGIN_RATE_LIMIT", defaults.login_rate_limit)?,
            bootstrap_admin_username: std::env::var("BOOTSTRAP_ADMIN_USERNAME")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.bootstrap_admin_username),
            bootstrap_admin_password: String::new(),
            sweep_orphans_on_start: Self::flag(
                "SWEEP_ORPHANS_ON_START",
                defaults.sweep_orphans_on_start,
            )?,
            trust_proxy_headers: Self::flag("TRUST_PROXY_HEADERS", defaults.trust_proxy_headers)?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            environment,
        };
        config.bootstrap_admin_password =
            config.require_secret("BOOTSTRAP_ADMIN_PASSWORD", &defaults.bootstrap_admin_password)?;

        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks applied after loading
    pub fn validate(&self) -> Result<(), BoxError> {
        if self.page_size == 0 {
            return Err("PAGE_SIZE must be at least 1".into());
        }
        if self.max_upload_bytes > self.max_request_bytes {
            return Err("MAX_UPLOAD_BYTES must not exceed MAX_REQUEST_BYTES".into());
        }
        // The orphan sweep owns every generated name in UPLOAD_DIR
        let upload_dir = std::path::absolute(&self.upload_dir)?;
        let database = std::path::absolute(Path::new(&self.database_path))?;
        if database.starts_with(&upload_dir) {
            return Err(format!(
                "DATABASE_PATH ({}) must not be inside UPLOAD_DIR ({})",
                database.display(),
                upload_dir.display()
            )
            .into());
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
