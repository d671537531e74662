//! Foundation types for the UUID file service (UFS).
//!
//! Every other UFS crate depends on `ufs-types`.
//!
//! # Key Types
//!
//! - [`FileId`]: strictly validated, hyphenated UUID addressing a file
//! - [`FileRecord`]: metadata for one stored file, including its blob path
//! - [`FileStat`]: the public projection of a record returned by `stat`

pub mod error;
pub mod id;
pub mod record;
pub mod time;

pub use error::TypeError;
pub use id::FileId;
pub use record::{normalize_mimetype, FileRecord, FileStat, DEFAULT_MIMETYPE};
pub use time::{format_timestamp, parse_timestamp, read_stored_timestamp, unreadable_timestamp};
