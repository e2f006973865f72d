//! Attachment store
//!
//! Ticket images live in a single flat directory, referenced from the ticket
//! row by a generated filename: `<YYYYmmdd_HHMMSS>_<6 hex>_<sanitized name>`.
//! Only PNG and JPEG images are accepted (extension and magic bytes).

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageFormat;
use rand::Rng;
use shared::{AppError, AppResult, ErrorCode};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Supported image extensions (lowercase)
pub const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg"];

/// Why an uploaded file was not stored
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentRejection {
    #[error("file name is empty after sanitization")]
    MissingName,
    #[error("extension not allowed: {0}")]
    Extension(String),
    #[error("file is empty")]
    Empty,
    #[error("file exceeds {0} bytes")]
    TooLarge(usize),
    #[error("content is not a PNG or JPEG image")]
    NotAnImage,
}

/// Reduce a client-supplied filename to a safe single path component.
///
/// Keeps the last component, maps whitespace to `_`, keeps ASCII
/// alphanumerics plus `.`, `-`, `_`, and strips leading/trailing `.`/`_`.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = last
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Whether `name` has the `<8 digits>_<6 digits>_<6 hex>_<name>.<png|jpg|jpeg>`
/// shape produced by [`AttachmentStore::store`]
pub fn is_generated_name(name: &str) -> bool {
    let mut parts = name.splitn(4, '_');
    let (Some(date), Some(time), Some(suffix), Some(rest)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let digits = |s: &str, n: usize| s.len() == n && s.bytes().all(|b| b.is_ascii_digit());
    digits(date, 8)
        && digits(time, 6)
        && suffix.len() == 6
        && suffix.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        && sanitize_filename(rest).as_deref() == Some(rest)
        && extension_of(rest).is_some_and(|ext| SUPPORTED_FORMATS.contains(&ext.as_str()))
}

/// Write `data` to a freshly created file, deleting it if the write fails
async fn write_or_discard<W>(mut file: W, path: &Path, data: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match file.write_all(data).await {
        Ok(()) => file.flush().await,
        Err(e) => Err(e),
    };
    if written.is_err() {
        drop(file);
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial attachment");
        }
    }
    written
}

/// Reject names that could escape the upload directory
fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains("..")
        && !filename.contains('/')
        && !filename.contains('\\')
}

#[derive(Debug, Clone)]
pub struct AttachmentStore {
    dir: Arc<PathBuf>,
    max_bytes: usize,
}

impl AttachmentStore {
    /// Open the store, creating the directory if needed
    pub fn new(dir: impl AsRef<Path>, max_bytes: usize) -> AppResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            AppError::storage(format!("Failed to create upload directory {}: {e}", dir.display()))
        })?;
        Ok(Self {
            dir: Arc::new(dir),
            max_bytes,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Check an upload and return its sanitized name
    pub fn validate(&self, original_name: &str, data: &[u8]) -> Result<String, AttachmentRejection> {
        let name = sanitize_filename(original_name).ok_or(AttachmentRejection::MissingName)?;

        let ext = extension_of(&name).unwrap_or_default();
        if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
            return Err(AttachmentRejection::Extension(ext));
        }

        if data.is_empty() {
            return Err(AttachmentRejection::Empty);
        }
        if data.len() > self.max_bytes {
            return Err(AttachmentRejection::TooLarge(self.max_bytes));
        }

        match image::guess_format(data) {
            Ok(ImageFormat::Png) | Ok(ImageFormat::Jpeg) => Ok(name),
            _ => Err(AttachmentRejection::NotAnImage),
        }
    }

    fn generate_name(sanitized: &str) -> String {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let suffix: u32 = rand::thread_rng().gen_range(0..0x100_0000);
        format!("{stamp}_{suffix:06x}_{sanitized}")
    }

    /// Write a validated upload under a fresh name and return that name
    pub async fn store(&self, sanitized: &str, data: &[u8]) -> AppResult<String> {
        for _ in 0..5 {
            let filename = Self::generate_name(sanitized);
            let path = self.dir.join(&filename);

            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            match file {
                Ok(file) => {
                    write_or_discard(file, &path, data)
                        .await
                        .map_err(|e| AppError::storage(format!("Failed to write {filename}: {e}")))?;

                    tracing::info!(filename = %filename, size = data.len(), "Attachment stored");
                    return Ok(filename);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(AppError::storage(format!("Failed to create {filename}: {e}")));
                }
            }
        }

        Err(AppError::storage("Could not allocate a unique attachment name"))
    }

    /// Path of a stored attachment, refusing names that leave the directory
    pub fn path_of(&self, filename: &str) -> AppResult<PathBuf> {
        if !is_safe_filename(filename) {
            return Err(AppError::with_message(ErrorCode::InvalidRequest, "Invalid filename")
                .with_detail("filename", filename));
        }
        Ok(self.dir.join(filename))
    }

    pub async fn read(&self, filename: &str) -> AppResult<Vec<u8>> {
        let path = self.path_of(filename)?;
        match tokio::fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::new(
                ErrorCode::AttachmentNotFound,
            )
            .with_detail("filename", filename)),
            Err(e) => Err(AppError::storage(format!("Failed to read {filename}: {e}"))),
        }
    }

    /// Remove an attachment; a missing file is not an error.
    /// Returns whether a file was actually deleted.
    pub async fn remove(&self, filename: &str) -> AppResult<bool> {
        let path = self.path_of(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(filename = %filename, "Attachment removed");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(filename = %filename, "Attachment already absent");
                Ok(false)
            }
            Err(e) => Err(AppError::storage(format!("Failed to remove {filename}: {e}"))),
        }
    }

    /// Delete generated attachment files that `referenced` does not name.
    /// Anything else in the directory is left alone.
    pub async fn sweep_orphans(&self, referenced: &HashSet<String>) -> AppResult<usize> {
        let mut entries = tokio::fs::read_dir(self.dir.as_path())
            .await
            .map_err(|e| AppError::storage(format!("Failed to list upload directory: {e}")))?;

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::storage(format!("Failed to list upload directory: {e}")))?
        {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_file || !is_generated_name(&name) || referenced.contains(&name) {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => {
                    tracing::info!(filename = %name, "Removed orphaned attachment");
                    removed += 1;
                }
                Err(e) => tracing::warn!(filename = %name, error = %e, "Failed to remove orphaned attachment"),
            }
        }

        Ok(removed)
    }
}
