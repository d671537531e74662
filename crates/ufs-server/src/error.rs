use std::path::PathBuf;

use thiserror::Error;
use ufs_protocol::StatusCode;
use ufs_store::StoreError;
use ufs_types::FileId;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("invalid UUID: {0:?}")]
    InvalidUuid(String),

    #[error("file not found: {0}")]
    NotFound(FileId),

    #[error("blob for {id} missing at {}", path.display())]
    BlobMissing { id: FileId, path: PathBuf },

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("blob I/O error on {}: {source}", path.display())]
    BlobIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("protocol error: {0}")]
    Protocol(#[from] ufs_protocol::ProtocolError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

impl ServeError {
    /// Status reported by the streaming binding.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidUuid(_) => StatusCode::InvalidArgument,
            Self::NotFound(_) | Self::BlobMissing { .. } => StatusCode::NotFound,
            Self::Store(_) | Self::BlobIo { .. } => StatusCode::FailedPrecondition,
            Self::Protocol(_) | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::Internal
            }
        }
    }

    /// Status reported by the unary binding.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidUuid(_) => 400,
            Self::NotFound(_) | Self::BlobMissing { .. } => 404,
            _ => 500,
        }
    }

    /// Message sent to clients. Server paths and internals stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidUuid(_) => "Invalid UUID format",
            Self::NotFound(_) => "File not found",
            Self::BlobMissing { .. } => "File missing on disk",
            Self::Store(_) => "Database error",
            Self::BlobIo { .. } => "File system error",
            Self::Protocol(_) | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                "Internal server error"
            }
        }
    }
}

pub type ServeResult<T> = Result<T, ServeError>;
