//! Object server for the UUID file service.
//!
//! [`ObjectServer`] holds the transport-independent logic (validate, look
//! up, respond or stream). Two bindings expose it:
//!
//! - [`router`]: the unary HTTP binding, built on axum;
//! - [`stream`]: the streaming binding, length-prefixed frames over TCP.
//!
//! Both bindings share one bounded worker budget per listener
//! ([`ServerConfig::max_workers`]).

pub mod config;
pub mod error;
pub mod handler;
pub mod object;
pub mod router;
pub mod server;
pub mod stream;

pub use config::ServerConfig;
pub use error::{ServeError, ServeResult};
pub use object::{ChunkReader, ObjectServer, ReadCall, ReadPhase, MAX_CHUNK_SIZE};
pub use server::{BoundServer, UfsServer};
pub use stream::StreamListener;
