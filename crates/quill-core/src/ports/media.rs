//! Media storage port - where uploaded images and attachments live.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};

/// The two kinds of upload a post can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    File,
}

impl MediaKind {
    pub fn directory(self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::File => "files",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "images" => Some(MediaKind::Image),
            "files" => Some(MediaKind::File),
            _ => None,
        }
    }
}

/// Relative location of a stored upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub path: String,
}

impl StoredMedia {
    pub fn url(&self) -> String {
        format!("/media/{}", self.path)
    }
}

/// Relative path for an upload made at `at`: `blog/<kind>/YYYY/MM/DD/<file_name>`.
pub fn upload_path(kind: MediaKind, at: DateTime<Utc>, file_name: &str) -> String {
    format!(
        "blog/{}/{:04}/{:02}/{:02}/{}",
        kind.directory(),
        at.year(),
        at.month(),
        at.day(),
        file_name
    )
}

/// Lower-cased extension of `original_name`, restricted to ASCII alphanumerics.
pub fn sanitized_extension(original_name: &str) -> Option<String> {
    let (_, ext) = original_name.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// `true` when `path` stays inside the media root.
pub fn is_safe_relative_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && path
            .split('/')
            .all(|part| !part.is_empty() && part != "." && part != "..")
}

#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store `bytes` under a date-keyed path and return where it went.
    async fn store(
        &self,
        kind: MediaKind,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredMedia, MediaError>;

    /// Read a stored upload back; `None` when it does not exist.
    async fn load(&self, path: &str) -> Result<Option<Vec<u8>>, MediaError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Invalid media path: {0}")]
    InvalidPath(String),

    #[error("Storage failure: {0}")]
    Io(String),
}
