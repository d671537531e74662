use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::debug;
use ufs_protocol::{endpoints, ErrorBody, HttpSignal, StatBody};
use ufs_types::{FileId, FileStat};

use crate::config::{Backend, ClientConfig};
use crate::error::{TransportFailure, TransportResult};
use crate::transport::{flush_sink, write_to_sink, FileTransport, Sink};

/// Unary transport: one HTTP request per operation.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    stat_timeout: Duration,
    read_timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> TransportResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| classify(&e))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            stat_timeout: config.stat_timeout,
            read_timeout: config.read_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str, timeout: Duration) -> TransportResult<Response> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(&e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        Err(TransportFailure::http(HttpSignal::Status(status.as_u16()), detail))
    }
}

/// Sort a client-library error into the unary signal set.
fn classify(err: &reqwest::Error) -> TransportFailure {
    let signal = if err.is_timeout() {
        HttpSignal::TimedOut
    } else if err.is_connect() {
        HttpSignal::ConnectFailed
    } else if let Some(status) = err.status() {
        HttpSignal::Status(status.as_u16())
    } else {
        HttpSignal::Other
    };
    TransportFailure::http(signal, err.to_string())
}

#[async_trait]
impl FileTransport for HttpTransport {
    fn backend(&self) -> Backend {
        Backend::Rest
    }

    async fn stat(&self, id: &FileId) -> TransportResult<FileStat> {
        let response = self.get(&endpoints::stat_path(&id.to_string()), self.stat_timeout).await?;
        let body: StatBody = response.json().await.map_err(|e| classify(&e))?;
        Ok(body.into())
    }

    async fn read(&self, id: &FileId, sink: &mut Sink<'_>) -> TransportResult<u64> {
        let response = self.get(&endpoints::read_path(&id.to_string()), self.read_timeout).await?;
        let body = response.bytes().await.map_err(|e| classify(&e))?;
        write_to_sink(sink, &body).await?;
        flush_sink(sink).await?;
        Ok(body.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ufs_protocol::ErrorKind;
    use ufs_protocol::CanonicalError;

    #[test]
    fn base_url_slash_is_normalized() {
        let t = HttpTransport::new(&ClientConfig::rest("http://files.local:5000/")).unwrap();
        assert_eq!(
            t.url(&endpoints::stat_path("123e4567-e89b-12d3-a456-426614174000")),
            "http://files.local:5000/file/123e4567-e89b-12d3-a456-426614174000/stat/"
        );
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        // bind then drop to get a port nobody listens on
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let t = HttpTransport::new(&ClientConfig::rest(format!("http://127.0.0.1:{port}/"))).unwrap();
        let failure = t.stat(&FileId::new_v4()).await.unwrap_err();
        assert_eq!(CanonicalError::from(failure).kind(), ErrorKind::Unavailable);
    }
}
