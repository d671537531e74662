use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};
use ufs_protocol::{DEFAULT_CHUNK_SIZE, MAX_MESSAGE_SIZE};
use ufs_store::RecordStore;
use ufs_types::{FileId, FileRecord, FileStat};

use crate::error::{ServeError, ServeResult};

/// Largest chunk a read will produce: what fits in one frame after the
/// message envelope.
pub const MAX_CHUNK_SIZE: usize = MAX_MESSAGE_SIZE - 64;

/// Lifecycle of one read call.
///
/// `Init → Validating → {Streaming | Buffering} → {Complete | Failed}`.
/// `Failed` can be entered from any non-terminal phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadPhase {
    Init,
    Validating,
    Streaming,
    Buffering,
    Complete,
    Failed,
}

impl ReadPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    pub fn can_advance_to(self, next: ReadPhase) -> bool {
        use ReadPhase::*;
        match (self, next) {
            (Init, Validating) => true,
            (Validating, Streaming | Buffering) => true,
            (Streaming | Buffering, Complete) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Tracks the phase of one read call for logging.
#[derive(Debug)]
pub struct ReadCall {
    target: String,
    phase: ReadPhase,
}

impl ReadCall {
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into(), phase: ReadPhase::Init }
    }

    pub fn phase(&self) -> ReadPhase {
        self.phase
    }

    /// Move to `next`. Illegal transitions are ignored and logged.
    pub fn advance(&mut self, next: ReadPhase) {
        if self.phase.can_advance_to(next) {
            debug!(target_id = %self.target, from = ?self.phase, to = ?next, "read phase");
            self.phase = next;
        } else {
            warn!(target_id = %self.target, from = ?self.phase, to = ?next, "ignoring illegal read phase transition");
        }
    }

    /// Record `err` as the terminal outcome and hand it back.
    pub fn fail(&mut self, err: ServeError) -> ServeError {
        self.advance(ReadPhase::Failed);
        err
    }
}

/// Single-pass sequence of chunks from one blob.
///
/// Every chunk has exactly `chunk_size` bytes except the last, which may be
/// shorter. No chunk is empty; an empty blob yields no chunks. Once the
/// sequence is exhausted (or failed) it stays exhausted.
pub struct ChunkReader {
    record: FileRecord,
    path: PathBuf,
    file: Option<File>,
    chunk_size: usize,
    bytes_read: u64,
}

impl ChunkReader {
    pub fn record(&self) -> &FileRecord {
        &self.record
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// The next chunk, or `None` once the blob is exhausted.
    pub async fn next_chunk(&mut self) -> ServeResult<Option<Vec<u8>>> {
        let Some(file) = self.file.as_mut() else {
            return Ok(None);
        };
        // grows as bytes arrive; a huge chunk size on a small blob stays small
        let mut buf = Vec::with_capacity(self.chunk_size.min(DEFAULT_CHUNK_SIZE));
        if let Err(source) = (&mut *file).take(self.chunk_size as u64).read_to_end(&mut buf).await {
            self.file = None;
            return Err(ServeError::BlobIo { path: self.path.clone(), source });
        }
        if buf.len() < self.chunk_size {
            self.file = None;
        }
        if buf.is_empty() {
            return Ok(None);
        }
        self.bytes_read += buf.len() as u64;
        Ok(Some(buf))
    }

    /// Drain the remaining chunks into one buffer.
    pub async fn read_to_end(mut self) -> ServeResult<Vec<u8>> {
        let mut body = Vec::with_capacity(usize::try_from(self.record.size).unwrap_or(0));
        while let Some(chunk) = self.next_chunk().await? {
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

/// Transport-independent file operations.
pub struct ObjectServer {
    store: Arc<dyn RecordStore>,
    default_chunk_size: usize,
}

impl ObjectServer {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store, default_chunk_size: DEFAULT_CHUNK_SIZE }
    }

    pub fn with_default_chunk_size(mut self, size: usize) -> Self {
        self.default_chunk_size = size.clamp(1, MAX_CHUNK_SIZE);
        self
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// `chunk_size <= 0` selects the default; larger requests are capped at
    /// [`MAX_CHUNK_SIZE`].
    pub fn resolve_chunk_size(&self, requested: i64) -> usize {
        if requested <= 0 {
            self.default_chunk_size
        } else {
            usize::try_from(requested).map_or(MAX_CHUNK_SIZE, |n| n.min(MAX_CHUNK_SIZE))
        }
    }

    fn lookup(&self, raw_id: &str) -> ServeResult<FileRecord> {
        let id = FileId::parse(raw_id).map_err(|_| ServeError::InvalidUuid(raw_id.to_string()))?;
        Ok(self.store.lookup(&id)?)
    }

    /// Validate, look up, and return the public metadata.
    pub fn stat(&self, raw_id: &str) -> ServeResult<FileStat> {
        let record = self.lookup(raw_id)?;
        debug!(id = %record.id, name = %record.name, "stat");
        Ok(record.stat())
    }

    /// Validate, look up, check the blob exists, and open it for chunked reading.
    pub async fn open_read(&self, raw_id: &str, chunk_size: i64) -> ServeResult<ChunkReader> {
        let record = self.lookup(raw_id)?;
        let path = self.store.blob_path(&record);
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(id = %record.id, path = %path.display(), "blob missing on disk");
                return Err(ServeError::BlobMissing { id: record.id, path });
            }
            Err(source) => return Err(ServeError::BlobIo { path, source }),
        };
        let chunk_size = self.resolve_chunk_size(chunk_size);
        info!(id = %record.id, name = %record.name, chunk_size, "opening blob");
        Ok(ChunkReader { record, path, file: Some(file), chunk_size, bytes_read: 0 })
    }

    /// Read a whole blob into memory, for transports without partial delivery.
    pub async fn read_all(&self, raw_id: &str) -> ServeResult<(FileRecord, Vec<u8>)> {
        let mut call = ReadCall::new(raw_id);
        call.advance(ReadPhase::Validating);
        let reader = self.open_read(raw_id, 0).await.map_err(|e| call.fail(e))?;
        call.advance(ReadPhase::Buffering);
        let record = reader.record().clone();
        let body = reader.read_to_end().await.map_err(|e| call.fail(e))?;
        call.advance(ReadPhase::Complete);
        info!(id = %record.id, bytes = body.len(), "read buffered");
        Ok((record, body))
    }
}

impl std::fmt::Debug for ObjectServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectServer")
            .field("default_chunk_size", &self.default_chunk_size)
            .finish()
    }
}
