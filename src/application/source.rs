use crate::error::{PipelineError, Rejection, Result};
use axum::BoxError;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio_util::io::StreamReader;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// An uploaded video staged on disk. Owned by exactly one run.
#[derive(Debug)]
pub struct SourceVideo {
    path: PathBuf,
    content_type: String,
    size_bytes: u64,
    duration_seconds: Option<f64>,
    removed: bool,
}

impl SourceVideo {
    /// Wraps a file that is already on disk.
    pub fn staged(path: impl Into<PathBuf>, content_type: &str, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            content_type: content_type.to_string(),
            size_bytes,
            duration_seconds: None,
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Set once the probe has run.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration_seconds
    }

    pub(crate) fn set_duration(&mut self, seconds: f64) {
        self.duration_seconds = Some(seconds);
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Deletes the staged file. Safe to call more than once; a failure is
    /// logged and otherwise ignored.
    pub async fn cleanup(&mut self) {
        if self.removed {
            return;
        }
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => info!(path = %self.path.display(), "removed staged source"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not remove staged source");
                return;
            }
        }
        self.removed = true;
    }
}

/// Receives uploads into the staging directory.
#[derive(Debug, Clone)]
pub struct SourceStore {
    upload_dir: PathBuf,
    max_bytes: u64,
}

impl SourceStore {
    /// `upload_dir` must already exist.
    pub fn new(upload_dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_bytes,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Refuses anything that is not `video/*` without touching the disk.
    pub fn check_content_type(&self, content_type: Option<&str>) -> Result<String> {
        match content_type {
            Some(ct) if ct.starts_with("video/") => Ok(ct.to_string()),
            other => Err(Rejection::NotVideo(other.map(str::to_string)).into()),
        }
    }

    /// Streams an upload into a uniquely named file.
    ///
    /// A payload above the size ceiling is rejected and its partial file
    /// removed, so a rejected upload leaves nothing behind.
    pub async fn stage<S, E>(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        stream: S,
    ) -> Result<SourceVideo>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Into<BoxError>,
    {
        let content_type = self.check_content_type(content_type)?;
        let path = self
            .upload_dir
            .join(format!("{}-{}", Uuid::new_v4(), sanitize_file_name(file_name)));

        match self.write_limited(&path, stream).await {
            Ok(size_bytes) => {
                info!(path = %path.display(), size_bytes, "staged upload");
                Ok(SourceVideo::staged(path, &content_type, size_bytes))
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&path).await {
                    if rm.kind() != io::ErrorKind::NotFound {
                        warn!(path = %path.display(), error = %rm, "could not remove partial upload");
                    }
                }
                Err(e)
            }
        }
    }

    async fn write_limited<S, E>(&self, path: &Path, stream: S) -> Result<u64>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Into<BoxError>,
    {
        let body_with_io_error = stream.map_err(|err| io::Error::new(io::ErrorKind::Other, err));
        let body_reader = StreamReader::new(body_with_io_error);
        futures::pin_mut!(body_reader);
        // one byte past the ceiling is enough to know it is too large
        let mut limited = body_reader.take(self.max_bytes.saturating_add(1));

        let mut file = BufWriter::new(File::create(path).await?);
        let written = tokio::io::copy(&mut limited, &mut file).await?;
        file.flush().await?;

        if written > self.max_bytes {
            return Err(PipelineError::RejectedInput(Rejection::TooLarge {
                limit: self.max_bytes,
            }));
        }
        Ok(written)
    }
}

static UNSAFE_CHARS: OnceLock<Regex> = OnceLock::new();

/// Keeps ASCII letters and digits, everything else becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let re = UNSAFE_CHARS.get_or_init(|| Regex::new(r"[^a-zA-Z0-9]").unwrap());
    let safe = re.replace_all(name, "_").into_owned();
    if safe.is_empty() {
        "upload".to_string()
    } else {
        safe
    }
}
