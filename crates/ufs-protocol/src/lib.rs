//! Wire protocols for the UUID file service.
//!
//! Two transports carry the same two operations, `stat` and `read`:
//!
//! - the unary transport is plain HTTP ([`endpoint`]): one request, one
//!   complete response body;
//! - the streaming transport is a framed protocol over TCP ([`message`],
//!   [`codec`]): one request frame, then a sequence of response frames.
//!
//! [`canonical`] translates the failure signals of either transport into one
//! protocol-agnostic [`ErrorKind`].

pub mod canonical;
pub mod codec;
pub mod endpoint;
pub mod error;
pub mod message;
pub mod status;

pub use canonical::{map_http, map_stream_code, CanonicalError, ErrorKind, HttpSignal};
pub use codec::{read_message, write_message, UfsCodec};
pub use endpoint::{endpoints, ErrorBody, FileListing, HealthResponse, ListedFile, StatBody};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    UfsMessage, WireTimestamp, DEFAULT_CHUNK_SIZE, MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};
pub use status::StatusCode;
