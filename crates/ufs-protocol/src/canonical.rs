//! Canonical error taxonomy and the per-transport mapping tables.
//!
//! Callers branch on [`ErrorKind`] only. The transport-specific signal is
//! consumed here and survives only as diagnostic text.

use std::fmt;

use crate::status::StatusCode;

/// Protocol-agnostic failure kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidUuid,
    NotFound,
    Unavailable,
    Timeout,
    ServerInternal,
    Unknown,
}

impl ErrorKind {
    /// Short user-facing description.
    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidUuid => "invalid UUID format",
            Self::NotFound => "file not found",
            Self::Unavailable => "server unavailable",
            Self::Timeout => "request timed out",
            Self::ServerInternal => "server storage error",
            Self::Unknown => "unexpected error",
        }
    }

    /// Whether a later attempt could succeed without changing the request.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Unavailable | Self::Timeout)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A failure translated into the canonical taxonomy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl CanonicalError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self { kind, detail: detail.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Translate a unary-transport signal.
    pub fn from_http(signal: HttpSignal, detail: impl Into<String>) -> Self {
        Self::new(map_http(signal), detail)
    }

    /// Translate a streaming-transport status code.
    pub fn from_stream_code(code: u32, detail: impl Into<String>) -> Self {
        Self::new(map_stream_code(code), detail)
    }
}

impl fmt::Display for CanonicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.detail)
        }
    }
}

impl std::error::Error for CanonicalError {}

/// Failure signals the unary (HTTP) transport can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpSignal {
    /// The server answered with a non-success status.
    Status(u16),
    /// The connection could not be established.
    ConnectFailed,
    /// The per-operation deadline passed.
    TimedOut,
    /// Anything else the client library reports (bad body, redirect loop, ...).
    Other,
}

/// Unary transport mapping table. Total over every signal.
pub fn map_http(signal: HttpSignal) -> ErrorKind {
    match signal {
        HttpSignal::Status(400) => ErrorKind::InvalidUuid,
        HttpSignal::Status(404) => ErrorKind::NotFound,
        HttpSignal::Status(408) | HttpSignal::Status(504) => ErrorKind::Timeout,
        HttpSignal::Status(503) => ErrorKind::Unavailable,
        HttpSignal::Status(500..=599) => ErrorKind::ServerInternal,
        HttpSignal::Status(_) => ErrorKind::Unknown,
        HttpSignal::ConnectFailed => ErrorKind::Unavailable,
        HttpSignal::TimedOut => ErrorKind::Timeout,
        HttpSignal::Other => ErrorKind::Unknown,
    }
}

/// Streaming transport mapping table. Total over every `u32`; numeric codes
/// outside [`StatusCode`] map to `Unknown`.
pub fn map_stream_code(code: u32) -> ErrorKind {
    match StatusCode::from_code(code) {
        Some(StatusCode::InvalidArgument) => ErrorKind::InvalidUuid,
        Some(StatusCode::NotFound) => ErrorKind::NotFound,
        Some(StatusCode::FailedPrecondition | StatusCode::Internal | StatusCode::DataLoss) => {
            ErrorKind::ServerInternal
        }
        Some(StatusCode::Unavailable) => ErrorKind::Unavailable,
        Some(StatusCode::DeadlineExceeded) => ErrorKind::Timeout,
        Some(_) | None => ErrorKind::Unknown,
    }
}
