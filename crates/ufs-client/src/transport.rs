use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use ufs_types::{FileId, FileStat};

use crate::config::Backend;
use crate::error::{TransportFailure, TransportResult};

/// Output for read payloads.
pub type Sink<'a> = dyn AsyncWrite + Unpin + Send + 'a;

/// One wire protocol for the two client operations.
///
/// Identifiers reaching a transport are already validated.
#[async_trait]
pub trait FileTransport: Send + Sync {
    fn backend(&self) -> Backend;

    async fn stat(&self, id: &FileId) -> TransportResult<FileStat>;

    /// Write the blob to `sink` and return the number of bytes written.
    async fn read(&self, id: &FileId, sink: &mut Sink<'_>) -> TransportResult<u64>;
}

pub(crate) async fn write_to_sink(sink: &mut Sink<'_>, data: &[u8]) -> TransportResult<()> {
    sink.write_all(data).await.map_err(|e| TransportFailure::Sink(e.to_string()))
}

pub(crate) async fn flush_sink(sink: &mut Sink<'_>) -> TransportResult<()> {
    sink.flush().await.map_err(|e| TransportFailure::Sink(e.to_string()))
}
