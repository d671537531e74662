//! Client for the UUID file service.
//!
//! [`TransferClient`] offers `stat` and `read` over either transport,
//! selected once through [`ClientConfig::backend`]. Failures from both
//! transports come back as one canonical [`ClientError`].

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod render;
pub mod sink;
pub mod stream;
pub mod transport;

pub use client::TransferClient;
pub use config::{Backend, ClientConfig};
pub use error::{ClientError, ClientResult, TransportFailure, TransportResult};
pub use http::HttpTransport;
pub use render::render_stat;
pub use sink::{OpenSink, OutputSink};
pub use stream::StreamTransport;
pub use transport::{FileTransport, Sink};

pub use ufs_protocol::ErrorKind;
