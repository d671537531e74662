use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use ufs_store::{MetadataStore, RecordStore};

use crate::config::ServerConfig;
use crate::error::{ServeError, ServeResult};
use crate::object::ObjectServer;
use crate::router::build_router;
use crate::stream::StreamListener;

/// UUID file server: both bindings over one record store.
pub struct UfsServer {
    config: ServerConfig,
    object: Arc<ObjectServer>,
}

impl UfsServer {
    /// Load the metadata document named in `config`. A missing or corrupt
    /// document starts the server with an empty store.
    pub fn new(config: ServerConfig) -> Self {
        let mut store = MetadataStore::load(&config.metadata_file);
        if let Some(root) = &config.blob_root {
            store = store.with_blob_root(root);
        }
        Self::with_store(config, Arc::new(store))
    }

    pub fn with_store(config: ServerConfig, store: Arc<dyn RecordStore>) -> Self {
        let object =
            Arc::new(ObjectServer::new(store).with_default_chunk_size(config.default_chunk_size));
        Self { config, object }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn object(&self) -> &Arc<ObjectServer> {
        &self.object
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(Arc::clone(&self.object), self.config.max_workers)
    }

    /// Bind both listeners without serving yet.
    pub async fn bind(self) -> ServeResult<BoundServer> {
        let http = TcpListener::bind(self.config.http_addr).await?;
        let stream = StreamListener::bind(
            self.config.stream_addr,
            Arc::clone(&self.object),
            self.config.max_workers,
        )
        .await?;
        Ok(BoundServer { router: self.router(), http, stream })
    }

    /// Bind and serve until either binding fails.
    pub async fn serve(self) -> ServeResult<()> {
        self.bind().await?.serve().await
    }
}

/// Both listeners bound; nothing accepted yet.
pub struct BoundServer {
    router: axum::Router,
    http: TcpListener,
    stream: StreamListener,
}

impl BoundServer {
    pub fn http_addr(&self) -> ServeResult<SocketAddr> {
        Ok(self.http.local_addr()?)
    }

    pub fn stream_addr(&self) -> ServeResult<SocketAddr> {
        self.stream.local_addr()
    }

    pub async fn serve(self) -> ServeResult<()> {
        self.serve_until(std::future::pending()).await
    }

    /// Serve both bindings until `shutdown` resolves or one of them fails.
    pub async fn serve_until<F>(self, shutdown: F) -> ServeResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        tracing::info!(
            http = ?self.http.local_addr().ok(),
            stream = ?self.stream.local_addr().ok(),
            "ufs server listening"
        );
        let http = axum::serve(self.http, self.router).into_future();
        tokio::select! {
            res = http => res.map_err(|e| ServeError::Internal(e.to_string())),
            res = self.stream.serve() => res,
            _ = shutdown => {
                tracing::info!("shutdown requested");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::tests::{sample_store, SAMPLE_ID};
    use ufs_protocol::{read_message, write_message, UfsMessage};

    fn local_config() -> ServerConfig {
        ServerConfig {
            http_addr: "127.0.0.1:0".parse().unwrap(),
            stream_addr: "127.0.0.1:0".parse().unwrap(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn server_construction() {
        let dir = tempfile::tempdir().unwrap();
        let server = UfsServer::with_store(local_config(), sample_store(dir.path()));
        assert_eq!(server.config().max_workers, 10);
        let _router = server.router();
    }

    #[test]
    fn missing_document_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            metadata_file: dir.path().join("absent.json"),
            ..local_config()
        };
        let server = UfsServer::new(config);
        assert!(server.object().store().list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn both_bindings_serve_and_shut_down() {
        let dir = tempfile::tempdir().unwrap();
        let bound = UfsServer::with_store(local_config(), sample_store(dir.path()))
            .bind()
            .await
            .unwrap();
        let stream_addr = bound.stream_addr().unwrap();
        assert_ne!(bound.http_addr().unwrap().port(), 0);

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(bound.serve_until(async move {
            let _ = rx.await;
        }));

        let mut socket = tokio::net::TcpStream::connect(stream_addr).await.unwrap();
        write_message(&mut socket, &UfsMessage::StatRequest { uuid: SAMPLE_ID.into() })
            .await
            .unwrap();
        let reply = read_message(&mut socket).await.unwrap().unwrap();
        assert!(matches!(reply, UfsMessage::StatReply { size: 13, .. }));

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
