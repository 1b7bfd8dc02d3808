use crate::domain::jobs::TranscodeJob;
use crate::ports::engine::TranscodeExecutor;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Runs the `ffmpeg` / `ffprobe` binaries as child processes.
#[derive(Debug, Clone)]
pub struct RealTranscodeExecutor {
    ffmpeg_bin: PathBuf,
    ffprobe_bin: PathBuf,
}

impl RealTranscodeExecutor {
    pub fn new(ffmpeg_bin: impl Into<PathBuf>, ffprobe_bin: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
        }
    }
}

impl Default for RealTranscodeExecutor {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

#[async_trait]
impl TranscodeExecutor for RealTranscodeExecutor {
    async fn run_ffmpeg_transcode(&self, job: &TranscodeJob) -> io::Result<Output> {
        let args = job.ffmpeg_args();
        debug!(segment = job.segment_index, ?args, "spawning ffmpeg");

        // The child dies with the future, so a timed out or cancelled task
        // does not leave an orphan encoder behind.
        Command::new(&self.ffmpeg_bin)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
    }

    async fn run_ffprobe_for_duration(&self, media_path: &Path) -> io::Result<Output> {
        Command::new(&self.ffprobe_bin)
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(media_path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
    }
}
