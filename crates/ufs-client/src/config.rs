use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which transport a client speaks. Chosen once, at construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Unary request/response over HTTP.
    Rest,
    /// Length-prefixed frames over TCP.
    #[default]
    Stream,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rest" | "http" => Ok(Self::Rest),
            "stream" | "grpc" => Ok(Self::Stream),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rest => "rest",
            Self::Stream => "stream",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub backend: Backend,
    /// `host:port` of the streaming binding.
    pub server: String,
    /// Base URL of the HTTP binding.
    pub base_url: String,
    /// Chunk size asked of the streaming binding; `<= 0` lets the server pick.
    pub chunk_size: i64,
    pub stat_timeout: Duration,
    /// Bounds the whole transfer, not each chunk.
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            server: "localhost:50051".to_string(),
            base_url: "http://localhost/".to_string(),
            chunk_size: 0,
            stat_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    pub fn rest(base_url: impl Into<String>) -> Self {
        Self { backend: Backend::Rest, base_url: base_url.into(), ..Self::default() }
    }

    pub fn stream(server: impl Into<String>) -> Self {
        Self { backend: Backend::Stream, server: server.into(), ..Self::default() }
    }
}
