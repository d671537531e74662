//! Metadata storage for the UUID file service.
//!
//! The store maps [`FileId`](ufs_types::FileId) to [`FileRecord`](ufs_types::FileRecord)
//! and mirrors the mapping to a single JSON document. It owns metadata only;
//! blob bytes live on the filesystem and are referenced by path.
//!
//! # Design Rules
//!
//! 1. The document is loaded once; a missing document is an empty store.
//! 2. Readers work on an immutable snapshot and never see a half-applied write.
//! 3. `save` replaces the whole document (last writer wins).
//! 4. Lookups are exact matches on the UUID value.

pub mod document;
pub mod error;
pub mod metadata;
pub mod traits;

pub use document::{DocumentEntry, MetadataDocument};
pub use error::{StoreError, StoreResult};
pub use metadata::MetadataStore;
pub use traits::RecordStore;
