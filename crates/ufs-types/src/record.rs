use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::FileId;
use crate::time::{format_timestamp, serde_rfc3339};

/// Mimetype used when the uploader did not provide one.
pub const DEFAULT_MIMETYPE: &str = "application/octet-stream";

/// Substitute [`DEFAULT_MIMETYPE`] for a missing or blank mimetype.
///
/// This is the only place the default is applied; both transports see
/// records that already went through it.
pub fn normalize_mimetype(mimetype: Option<&str>) -> String {
    match mimetype.map(str::trim) {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => DEFAULT_MIMETYPE.to_string(),
    }
}

/// Metadata for one stored file.
///
/// The record does not own the file bytes; `storage_path` points at the blob
/// on disk. `created_at` orders records; `created_text` is what clients are
/// shown, normally the creation time exactly as it was stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: FileId,
    pub name: String,
    pub size: u64,
    pub mimetype: String,
    #[serde(with = "serde_rfc3339")]
    pub created_at: DateTime<Utc>,
    pub created_text: String,
    pub storage_path: String,
}

impl FileRecord {
    pub fn new(
        id: FileId,
        name: impl Into<String>,
        size: u64,
        mimetype: Option<&str>,
        created_at: DateTime<Utc>,
        storage_path: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            size,
            mimetype: normalize_mimetype(mimetype),
            created_at,
            created_text: format_timestamp(&created_at),
            storage_path: storage_path.into(),
        }
    }

    /// Replace the displayed creation time, e.g. with the stored text.
    pub fn with_created_text(mut self, text: impl Into<String>) -> Self {
        self.created_text = text.into();
        self
    }

    /// The public projection returned by `stat`.
    pub fn stat(&self) -> FileStat {
        FileStat {
            name: self.name.clone(),
            size: self.size,
            mimetype: self.mimetype.clone(),
            created_at: self.created_at,
            created_text: self.created_text.clone(),
        }
    }
}

/// File metadata as seen by clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    pub name: String,
    pub size: u64,
    pub mimetype: String,
    #[serde(with = "serde_rfc3339")]
    pub created_at: DateTime<Utc>,
    pub created_text: String,
}
