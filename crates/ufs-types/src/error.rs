use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid UUID: {0:?}")]
    InvalidUuid(String),

    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
}
