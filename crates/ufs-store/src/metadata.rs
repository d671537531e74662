use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};
use ufs_types::{FileId, FileRecord};

use crate::document::MetadataDocument;
use crate::error::{StoreError, StoreResult};
use crate::traits::RecordStore;

type Snapshot = Arc<BTreeMap<FileId, FileRecord>>;

/// JSON-document backed metadata store.
///
/// The mapping is held as an immutable snapshot behind an `Arc`. Readers
/// clone the `Arc` and release the lock immediately; writers copy the map
/// (only if a reader still holds the old snapshot) and swap the new one in.
/// A reader therefore sees either the state before or after an update.
pub struct MetadataStore {
    path: PathBuf,
    blob_root: PathBuf,
    records: RwLock<Snapshot>,
}

impl MetadataStore {
    /// Create an empty store that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let blob_root = default_blob_root(&path);
        Self {
            path,
            blob_root,
            records: RwLock::new(Arc::new(BTreeMap::new())),
        }
    }

    /// Load the document at `path`.
    ///
    /// A missing, unreadable or corrupt document yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let store = Self::new(path);
        let records = match fs::read(&store.path) {
            Ok(bytes) => match MetadataDocument::decode_records(&bytes) {
                Ok(records) => records,
                Err(e) => {
                    warn!(path = %store.path.display(), error = %e, "metadata document is corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %store.path.display(), "no metadata document, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                warn!(path = %store.path.display(), error = %e, "metadata document is unreadable, starting empty");
                BTreeMap::new()
            }
        };
        info!(path = %store.path.display(), files = records.len(), "metadata loaded");
        *store.records.write().expect("lock poisoned") = Arc::new(records);
        store
    }

    /// Resolve relative storage paths against `root` instead of the
    /// document's directory.
    pub fn with_blob_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.blob_root = root.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn blob_root(&self) -> &Path {
        &self.blob_root
    }

    /// Current immutable view of the mapping.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.records.read().expect("lock poisoned"))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Add or replace a record. This is the seam used by the upload path.
    pub fn insert(&self, record: FileRecord) {
        let mut guard = self.records.write().expect("lock poisoned");
        debug!(id = %record.id, name = %record.name, "inserting metadata record");
        Arc::make_mut(&mut *guard).insert(record.id, record);
    }

    /// Write the whole mapping back, replacing the document.
    ///
    /// The document is written to a temporary sibling and renamed into place.
    /// Concurrent saves are last-writer-wins.
    pub fn save(&self) -> StoreResult<()> {
        let snapshot = self.snapshot();
        let bytes = MetadataDocument::from_records(snapshot.values()).to_json()?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| self.io_error(e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| self.io_error(e))?;
        tmp.write_all(&bytes).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        info!(path = %self.path.display(), files = snapshot.len(), "metadata saved");
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl RecordStore for MetadataStore {
    fn lookup(&self, id: &FileId) -> StoreResult<FileRecord> {
        self.snapshot()
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(*id))
    }

    fn list(&self) -> StoreResult<Vec<FileRecord>> {
        let mut records: Vec<FileRecord> = self.snapshot().values().cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    fn blob_path(&self, record: &FileRecord) -> PathBuf {
        let path = Path::new(&record.storage_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.blob_root.join(path)
        }
    }
}

impl std::fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataStore")
            .field("path", &self.path)
            .field("file_count", &self.len())
            .finish()
    }
}

fn default_blob_root(document: &Path) -> PathBuf {
    match document.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
