use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;
use ufs_protocol::{read_message, write_message, ProtocolError, StatusCode, UfsMessage};
use ufs_types::{FileId, FileStat};

use crate::config::{Backend, ClientConfig};
use crate::error::{TransportFailure, TransportResult};
use crate::transport::{flush_sink, write_to_sink, FileTransport, Sink};

/// Streaming transport: one TCP connection per call.
pub struct StreamTransport {
    server: String,
    chunk_size: i64,
    connect_timeout: Duration,
    stat_timeout: Duration,
    read_timeout: Duration,
}

impl StreamTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            server: config.server.clone(),
            chunk_size: config.chunk_size,
            connect_timeout: config.connect_timeout,
            stat_timeout: config.stat_timeout,
            read_timeout: config.read_timeout,
        }
    }

    async fn connect(&self) -> TransportResult<TcpStream> {
        let attempt = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.server));
        match attempt.await {
            Ok(Ok(socket)) => {
                socket.set_nodelay(true).map_err(io_failure)?;
                Ok(socket)
            }
            Ok(Err(e)) => Err(TransportFailure::stream(
                StatusCode::Unavailable,
                format!("connect {}: {e}", self.server),
            )),
            Err(_) => Err(TransportFailure::stream(
                StatusCode::Unavailable,
                format!("connect {}: timed out", self.server),
            )),
        }
    }

    async fn within<T>(
        &self,
        limit: Duration,
        call: impl Future<Output = TransportResult<T>>,
    ) -> TransportResult<T> {
        tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
            Err(TransportFailure::stream(
                StatusCode::DeadlineExceeded,
                format!("no answer within {limit:?}"),
            ))
        })
    }
}

fn io_failure(e: std::io::Error) -> TransportFailure {
    TransportFailure::stream(StatusCode::Unavailable, e.to_string())
}

fn protocol_failure(e: ProtocolError) -> TransportFailure {
    match e {
        ProtocolError::Io(e) => io_failure(e),
        other => TransportFailure::stream(StatusCode::Unknown, other.to_string()),
    }
}

fn closed_early() -> TransportFailure {
    TransportFailure::stream(StatusCode::Unavailable, "connection closed before the call finished")
}

fn unexpected(msg: &UfsMessage) -> TransportFailure {
    TransportFailure::stream(StatusCode::Unknown, format!("unexpected {} frame", msg.type_name()))
}

#[async_trait]
impl FileTransport for StreamTransport {
    fn backend(&self) -> Backend {
        Backend::Stream
    }

    async fn stat(&self, id: &FileId) -> TransportResult<FileStat> {
        self.within(self.stat_timeout, async {
            let mut socket = self.connect().await?;
            let request = UfsMessage::StatRequest { uuid: id.to_string() };
            write_message(&mut socket, &request).await.map_err(protocol_failure)?;
            match read_message(&mut socket).await.map_err(protocol_failure)? {
                Some(UfsMessage::StatReply { name, size, mimetype, created, created_text }) => {
                    let created_at = created.to_datetime().map_err(protocol_failure)?;
                    Ok(FileStat { name, size, mimetype, created_at, created_text })
                }
                Some(UfsMessage::Status { code, message }) => {
                    Err(TransportFailure::stream(code, message))
                }
                Some(other) => Err(unexpected(&other)),
                None => Err(closed_early()),
            }
        })
        .await
    }

    async fn read(&self, id: &FileId, sink: &mut Sink<'_>) -> TransportResult<u64> {
        self.within(self.read_timeout, async {
            let mut socket = self.connect().await?;
            let request = UfsMessage::ReadRequest { uuid: id.to_string(), chunk_size: self.chunk_size };
            write_message(&mut socket, &request).await.map_err(protocol_failure)?;
            let mut written = 0u64;
            loop {
                match read_message(&mut socket).await.map_err(protocol_failure)? {
                    Some(UfsMessage::Chunk { data }) => {
                        write_to_sink(sink, &data).await?;
                        written += data.len() as u64;
                    }
                    Some(UfsMessage::End) => break,
                    Some(UfsMessage::Status { code, message }) => {
                        return Err(TransportFailure::stream(code, message));
                    }
                    Some(other) => return Err(unexpected(&other)),
                    None => return Err(closed_early()),
                }
            }
            flush_sink(sink).await?;
            debug!(%id, bytes = written, "stream read complete");
            Ok(written)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use ufs_protocol::{CanonicalError, ErrorKind};

    fn transport_for(addr: std::net::SocketAddr) -> StreamTransport {
        StreamTransport::new(&ClientConfig::stream(addr.to_string()))
    }

    /// A one-shot peer that answers any request with `frames`, then closes.
    async fn scripted_peer(frames: Vec<UfsMessage>) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = read_message(&mut socket).await;
            for frame in &frames {
                write_message(&mut socket, frame).await.unwrap();
            }
        });
        addr
    }

    #[tokio::test]
    async fn status_frame_maps_through_table() {
        let addr = scripted_peer(vec![UfsMessage::Status {
            code: StatusCode::FailedPrecondition.code(),
            message: "Database error".into(),
        }])
        .await;
        let failure = transport_for(addr).stat(&FileId::new_v4()).await.unwrap_err();
        let err = CanonicalError::from(failure);
        assert_eq!(err.kind(), ErrorKind::ServerInternal);
        assert_eq!(err.detail, "Database error");
    }

    #[tokio::test]
    async fn unknown_status_code_is_unknown() {
        let addr = scripted_peer(vec![UfsMessage::Status { code: 4242, message: "?".into() }]).await;
        let failure = transport_for(addr).stat(&FileId::new_v4()).await.unwrap_err();
        assert_eq!(CanonicalError::from(failure).kind(), ErrorKind::Unknown);
    }

    #[tokio::test]
    async fn stream_cut_before_end_is_unavailable() {
        let addr = scripted_peer(vec![UfsMessage::Chunk { data: b"Hello".to_vec() }]).await;
        let mut sink = Vec::new();
        let failure = transport_for(addr).read(&FileId::new_v4(), &mut sink).await.unwrap_err();
        assert_eq!(CanonicalError::from(failure).kind(), ErrorKind::Unavailable);
        assert_eq!(sink, b"Hello");
    }

    #[tokio::test]
    async fn chunks_written_in_order() {
        let addr = scripted_peer(vec![
            UfsMessage::Chunk { data: b"Hello, ".to_vec() },
            UfsMessage::Chunk { data: b"world!".to_vec() },
            UfsMessage::End,
        ])
        .await;
        let mut sink = Vec::new();
        let n = transport_for(addr).read(&FileId::new_v4(), &mut sink).await.unwrap();
        assert_eq!(n, 13);
        assert_eq!(sink, b"Hello, world!");
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });
        let mut config = ClientConfig::stream(addr.to_string());
        config.stat_timeout = Duration::from_millis(100);
        let failure = StreamTransport::new(&config).stat(&FileId::new_v4()).await.unwrap_err();
        assert_eq!(CanonicalError::from(failure).kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let t = StreamTransport::new(&ClientConfig::stream(format!("127.0.0.1:{port}")));
        let failure = t.stat(&FileId::new_v4()).await.unwrap_err();
        assert_eq!(CanonicalError::from(failure).kind(), ErrorKind::Unavailable);
    }
}
