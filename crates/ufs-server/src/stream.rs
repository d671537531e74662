use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use ufs_protocol::{read_message, write_message, StatusCode, UfsMessage};

use crate::error::{ServeError, ServeResult};
use crate::object::{ObjectServer, ReadCall, ReadPhase};

/// Streaming binding: one call per connection, length-prefixed frames.
///
/// At most `max_workers` connections are served at once. A read holds its
/// slot until the last frame is written or the client goes away.
pub struct StreamListener {
    listener: TcpListener,
    server: Arc<ObjectServer>,
    workers: Arc<Semaphore>,
}

impl StreamListener {
    pub async fn bind(
        addr: SocketAddr,
        server: Arc<ObjectServer>,
        max_workers: usize,
    ) -> ServeResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::from_listener(listener, server, max_workers))
    }

    pub fn from_listener(
        listener: TcpListener,
        server: Arc<ObjectServer>,
        max_workers: usize,
    ) -> Self {
        Self { listener, server, workers: Arc::new(Semaphore::new(max_workers.max(1))) }
    }

    pub fn local_addr(&self) -> ServeResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the task is dropped. Accept errors are
    /// logged and never end the binding.
    pub async fn serve(self) -> ServeResult<()> {
        info!(addr = ?self.listener.local_addr().ok(), "stream binding listening");
        loop {
            let permit = Arc::clone(&self.workers)
                .acquire_owned()
                .await
                .map_err(|e| ServeError::Internal(e.to_string()))?;
            let (socket, peer) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    drop(permit);
                    match accept_backoff(&e) {
                        None => debug!(error = %e, "connection dropped before accept"),
                        Some(delay) => {
                            warn!(error = %e, ?delay, "accept failed; backing off");
                            tokio::time::sleep(delay).await;
                        }
                    }
                    continue;
                }
            };
            let server = Arc::clone(&self.server);
            tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = handle_connection(socket, &server).await {
                    warn!(%peer, error = %e, "stream call aborted");
                }
            });
        }
    }
}

/// How long to pause after a failed `accept`. Errors tied to a single
/// connection retry at once; anything else (such as running out of file
/// descriptors) waits so the loop does not spin.
fn accept_backoff(err: &io::Error) -> Option<Duration> {
    match err.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset => None,
        _ => Some(Duration::from_secs(1)),
    }
}

async fn handle_connection(mut socket: TcpStream, server: &ObjectServer) -> ServeResult<()> {
    socket.set_nodelay(true)?;
    let (mut reader, mut writer) = socket.split();
    serve_call(&mut reader, &mut writer, server).await
}

/// Read one request frame and answer it.
pub(crate) async fn serve_call<R, W>(
    reader: &mut R,
    writer: &mut W,
    server: &ObjectServer,
) -> ServeResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let request = match read_message(reader).await {
        Ok(Some(msg)) => msg,
        Ok(None) => {
            debug!("connection closed before a request");
            return Ok(());
        }
        Err(e) => {
            let status = status_frame(StatusCode::InvalidArgument, "Malformed request");
            write_message(writer, &status).await?;
            return Err(e.into());
        }
    };

    match request {
        UfsMessage::StatRequest { uuid } => {
            let reply = match server.stat(&uuid) {
                Ok(stat) => UfsMessage::stat_reply(&stat),
                Err(e) => error_frame(&e),
            };
            write_message(writer, &reply).await?;
            Ok(())
        }
        UfsMessage::ReadRequest { uuid, chunk_size } => {
            stream_read(writer, server, &uuid, chunk_size).await
        }
        other => {
            warn!(kind = other.type_name(), "unexpected request frame");
            let status = status_frame(StatusCode::InvalidArgument, "Unexpected request");
            write_message(writer, &status).await?;
            Ok(())
        }
    }
}

async fn stream_read<W>(
    writer: &mut W,
    server: &ObjectServer,
    uuid: &str,
    chunk_size: i64,
) -> ServeResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut call = ReadCall::new(uuid);
    call.advance(ReadPhase::Validating);
    let mut reader = match server.open_read(uuid, chunk_size).await {
        Ok(reader) => reader,
        Err(e) => {
            let e = call.fail(e);
            write_message(writer, &error_frame(&e)).await?;
            return Ok(());
        }
    };
    call.advance(ReadPhase::Streaming);

    loop {
        match reader.next_chunk().await {
            Ok(Some(data)) => {
                if let Err(e) = write_message(writer, &UfsMessage::Chunk { data }).await {
                    // client went away; nothing left to tell it
                    call.fail(e.into());
                    info!(id = %reader.record().id, sent = reader.bytes_read(), "client disconnected mid-read");
                    return Ok(());
                }
            }
            Ok(None) => break,
            Err(e) => {
                let e = call.fail(e);
                write_message(writer, &error_frame(&e)).await?;
                return Ok(());
            }
        }
    }

    write_message(writer, &UfsMessage::End).await?;
    call.advance(ReadPhase::Complete);
    info!(id = %reader.record().id, bytes = reader.bytes_read(), "read streamed");
    Ok(())
}

fn status_frame(code: StatusCode, message: &str) -> UfsMessage {
    UfsMessage::Status { code: code.code(), message: message.to_string() }
}

fn error_frame(err: &ServeError) -> UfsMessage {
    status_frame(err.status_code(), err.public_message())
}
