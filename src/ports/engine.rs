use crate::domain::jobs::TranscodeJob;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Output;

/// Narrow command interface to the external transcoding engine.
///
/// Implementations only run the processes; interpreting the output belongs
/// to the application layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscodeExecutor: Send + Sync {
    /// Run one segment extraction + scale/pad + encode.
    async fn run_ffmpeg_transcode(&self, job: &TranscodeJob) -> io::Result<Output>;

    /// Ask the engine for the container duration of `media_path`.
    async fn run_ffprobe_for_duration(&self, media_path: &Path) -> io::Result<Output>;
}
