use thiserror::Error;
use ufs_protocol::{CanonicalError, ErrorKind, HttpSignal};

/// What a transport reports before translation into the canonical taxonomy.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportFailure {
    #[error("http: {detail}")]
    Http { signal: HttpSignal, detail: String },

    #[error("stream status {code}: {detail}")]
    Stream { code: u32, detail: String },

    /// The local output sink failed.
    #[error("output: {0}")]
    Sink(String),
}

impl TransportFailure {
    pub fn http(signal: HttpSignal, detail: impl Into<String>) -> Self {
        Self::Http { signal, detail: detail.into() }
    }

    pub fn stream(code: impl Into<u32>, detail: impl Into<String>) -> Self {
        Self::Stream { code: code.into(), detail: detail.into() }
    }
}

impl From<TransportFailure> for CanonicalError {
    fn from(failure: TransportFailure) -> Self {
        match failure {
            TransportFailure::Http { signal, detail } => CanonicalError::from_http(signal, detail),
            TransportFailure::Stream { code, detail } => {
                CanonicalError::from_stream_code(code, detail)
            }
            TransportFailure::Sink(detail) => CanonicalError::new(ErrorKind::Unknown, detail),
        }
    }
}

/// Errors surfaced to callers: a canonical kind plus diagnostic text.
pub type ClientError = CanonicalError;

pub type ClientResult<T> = Result<T, ClientError>;

pub type TransportResult<T> = Result<T, TransportFailure>;
