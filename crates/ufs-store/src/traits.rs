use std::path::PathBuf;

use ufs_types::{FileId, FileRecord};

use crate::error::StoreResult;

/// Read access to file records.
///
/// Implementations must satisfy:
/// - `lookup` is an exact match on the identifier; no prefix matching.
/// - A reader never observes a partially applied update.
/// - Failures of the backing storage are returned as errors, distinct from
///   `StoreError::NotFound`.
pub trait RecordStore: Send + Sync {
    /// Fetch the record for `id`, or `StoreError::NotFound`.
    fn lookup(&self, id: &FileId) -> StoreResult<FileRecord>;

    /// All records, oldest first.
    fn list(&self) -> StoreResult<Vec<FileRecord>>;

    /// Where the blob for `record` lives on disk.
    fn blob_path(&self, record: &FileRecord) -> PathBuf;
}
