use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tempfile::{NamedTempFile, TempPath};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use ufs_protocol::ErrorKind;

use crate::error::{ClientError, ClientResult};
use crate::transport::Sink;

/// Where command output goes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputSink {
    #[default]
    Stdout,
    /// Written through a sibling temp file that replaces the target only
    /// when the operation succeeds.
    File(PathBuf),
}

impl FromStr for OutputSink {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == "-" { Self::Stdout } else { Self::File(PathBuf::from(s)) })
    }
}

impl fmt::Display for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("-"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl OutputSink {
    pub async fn open(&self) -> ClientResult<OpenSink> {
        match self {
            Self::Stdout => Ok(OpenSink { writer: Box::new(tokio::io::stdout()), staged: None }),
            Self::File(path) => {
                let temp =
                    NamedTempFile::new_in(staging_dir(path)).map_err(|e| output_error(path, e))?;
                let (file, temp_path) = temp.into_parts();
                debug!(output = %path.display(), staged = %temp_path.display(), "staging output");
                Ok(OpenSink {
                    writer: Box::new(tokio::fs::File::from_std(file)),
                    staged: Some(Staged { temp_path, target: path.clone() }),
                })
            }
        }
    }
}

/// Directory for the temp file: next to the target so the final rename
/// stays on one filesystem.
fn staging_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn output_error(path: &Path, e: impl fmt::Display) -> ClientError {
    ClientError::new(ErrorKind::Unknown, format!("{}: {e}", path.display()))
}

struct Staged {
    temp_path: TempPath,
    target: PathBuf,
}

/// An opened [`OutputSink`]. Call [`OpenSink::finish`] with the outcome.
pub struct OpenSink {
    writer: Box<Sink<'static>>,
    staged: Option<Staged>,
}

impl OpenSink {
    pub fn writer(&mut self) -> &mut Sink<'static> {
        &mut *self.writer
    }

    /// Flush on success and move a staged file over its target. On failure
    /// the staged file is discarded and the target is left untouched.
    pub async fn finish<T>(mut self, outcome: ClientResult<T>) -> ClientResult<T> {
        match outcome {
            Ok(value) => {
                self.writer.flush().await.map_err(|e| {
                    ClientError::new(ErrorKind::Unknown, format!("flushing output: {e}"))
                })?;
                drop(self.writer);
                if let Some(Staged { temp_path, target }) = self.staged {
                    temp_path.persist(&target).map_err(|e| output_error(&target, e.error))?;
                }
                Ok(value)
            }
            Err(err) => {
                drop(self.writer);
                if let Some(Staged { temp_path, target }) = self.staged {
                    if let Err(e) = temp_path.close() {
                        warn!(output = %target.display(), error = %e, "could not remove staged output");
                    }
                }
                Err(err)
            }
        }
    }
}
