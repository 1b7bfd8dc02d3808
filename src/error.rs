//! Error types shared by the pipeline and its adapters.

use thiserror::Error;

/// Why an upload was refused before any processing started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Carries the declared content type, if any.
    #[error("Only video files are allowed")]
    NotVideo(Option<String>),
    #[error("File too large (limit is {limit} bytes)")]
    TooLarge { limit: u64 },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad options, or a non-positive duration / segment length.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    RejectedInput(#[from] Rejection),

    /// The duration probe could not run or returned garbage.
    #[error("Could not probe video duration: {0}")]
    ProbeFailure(String),

    /// A segment's engine invocation failed.
    #[error("Transcoding failed: {0}")]
    EngineFailure(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// True for errors detected before anything was launched.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidInput(_) | PipelineError::RejectedInput(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
