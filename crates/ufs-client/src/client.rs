use tracing::{debug, info};
use ufs_protocol::ErrorKind;
use ufs_types::{FileId, FileStat};

use crate::config::{Backend, ClientConfig};
use crate::error::{ClientError, ClientResult};
use crate::http::HttpTransport;
use crate::render::render_stat;
use crate::sink::OutputSink;
use crate::stream::StreamTransport;
use crate::transport::{write_to_sink, FileTransport, Sink};

/// Client for the file service over one transport.
///
/// Identifiers are validated locally; a malformed id never reaches the
/// transport.
pub struct TransferClient {
    transport: Box<dyn FileTransport>,
}

impl TransferClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let transport: Box<dyn FileTransport> = match config.backend {
            Backend::Rest => Box::new(HttpTransport::new(config)?),
            Backend::Stream => Box::new(StreamTransport::new(config)),
        };
        Ok(Self::with_transport(transport))
    }

    pub fn with_transport(transport: Box<dyn FileTransport>) -> Self {
        Self { transport }
    }

    pub fn backend(&self) -> Backend {
        self.transport.backend()
    }

    /// Fetch metadata without rendering it.
    pub async fn fetch_stat(&self, raw_id: &str) -> ClientResult<FileStat> {
        let id = validate(raw_id)?;
        debug!(%id, backend = %self.backend(), "stat");
        Ok(self.transport.stat(&id).await?)
    }

    /// Fetch metadata and write the four-line rendering to `sink`.
    pub async fn stat(&self, raw_id: &str, sink: &mut Sink<'_>) -> ClientResult<()> {
        let stat = self.fetch_stat(raw_id).await?;
        write_to_sink(sink, render_stat(&stat).as_bytes()).await?;
        Ok(())
    }

    /// Copy the blob to `sink`; returns the byte count.
    pub async fn read(&self, raw_id: &str, sink: &mut Sink<'_>) -> ClientResult<u64> {
        let id = validate(raw_id)?;
        debug!(%id, backend = %self.backend(), "read");
        let bytes = self.transport.read(&id, sink).await?;
        info!(%id, bytes, "read complete");
        Ok(bytes)
    }

    pub async fn stat_to(&self, raw_id: &str, output: &OutputSink) -> ClientResult<()> {
        let stat = self.fetch_stat(raw_id).await?;
        let mut open = output.open().await?;
        let outcome = write_to_sink(open.writer(), render_stat(&stat).as_bytes())
            .await
            .map_err(ClientError::from);
        open.finish(outcome).await
    }

    /// Like [`read`](Self::read), opening `output` only after the id
    /// validates. A failed read leaves an existing output file as it was.
    pub async fn read_to(&self, raw_id: &str, output: &OutputSink) -> ClientResult<u64> {
        validate(raw_id)?;
        let mut open = output.open().await?;
        let outcome = self.read(raw_id, open.writer()).await;
        open.finish(outcome).await
    }
}

fn validate(raw_id: &str) -> ClientResult<FileId> {
    FileId::parse(raw_id).map_err(|e| ClientError::new(ErrorKind::InvalidUuid, e.to_string()))
}
