use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ufs_types::FileStat;

use crate::error::{ProtocolError, ProtocolResult};

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Chunk size used when a read requests `chunk_size <= 0`.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Seconds and nanoseconds since the Unix epoch, UTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl WireTimestamp {
    pub fn to_datetime(self) -> ProtocolResult<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos).ok_or(ProtocolError::InvalidTimestamp {
            seconds: self.seconds,
            nanos: self.nanos,
        })
    }
}

impl From<DateTime<Utc>> for WireTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }
}

/// All frames of the streaming transport.
///
/// `StatReply` carries the creation time both as an instant and as the
/// text to display, which is the stored text when there is one.
///
/// A call is one request frame from the client (`StatRequest` or
/// `ReadRequest`) answered by:
/// - `StatReply`, or
/// - zero or more `Chunk` frames followed by `End`, or
/// - a single `Status` frame carrying the failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UfsMessage {
    StatRequest { uuid: String },
    ReadRequest { uuid: String, chunk_size: i64 },
    StatReply {
        name: String,
        size: u64,
        mimetype: String,
        created: WireTimestamp,
        created_text: String,
    },
    Chunk { data: Vec<u8> },
    End,
    Status { code: u32, message: String },
}

impl UfsMessage {
    pub fn type_tag(&self) -> u8 {
        match self {
            Self::StatRequest { .. } => 1,
            Self::ReadRequest { .. } => 2,
            Self::StatReply { .. } => 3,
            Self::Chunk { .. } => 4,
            Self::End => 5,
            Self::Status { .. } => 255,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::StatRequest { .. } => "StatRequest",
            Self::ReadRequest { .. } => "ReadRequest",
            Self::StatReply { .. } => "StatReply",
            Self::Chunk { .. } => "Chunk",
            Self::End => "End",
            Self::Status { .. } => "Status",
        }
    }

    pub fn stat_reply(stat: &FileStat) -> Self {
        Self::StatReply {
            name: stat.name.clone(),
            size: stat.size,
            mimetype: stat.mimetype.clone(),
            created: stat.created_at.into(),
            created_text: stat.created_text.clone(),
        }
    }
}
