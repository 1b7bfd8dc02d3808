use crate::domain::geometry::Dimensions;
use crate::domain::jobs::TranscodeJob;
use crate::domain::outcome::{SegmentReport, TranscodeOutcome};
use crate::domain::segments::Segment;
use crate::ports::engine::TranscodeExecutor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub const DEFAULT_VIDEO_BITRATE: &str = "4000k";

/// Stderr lines kept in a failure cause. ffmpeg prints its banner and the
/// stream mapping first; the actual error is at the end.
const DIAGNOSTIC_LINES: usize = 5;

/// Settings shared read-only by every task of a run.
#[derive(Debug, Clone)]
pub struct TranscodeSettings {
    pub output_dir: PathBuf,
    pub video_bitrate: String,
    /// Upper bound for one engine invocation. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl TranscodeSettings {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            video_bitrate: DEFAULT_VIDEO_BITRATE.to_string(),
            timeout: None,
        }
    }
}

/// Extracts one segment of `source` into its numbered clip.
///
/// Never returns an error: every engine problem becomes
/// `TranscodeOutcome::Failed` with the engine's diagnostic. No retries.
pub async fn transcode_segment<E>(
    executor: &E,
    source: &Path,
    segment: Segment,
    dimensions: Dimensions,
    settings: &TranscodeSettings,
    cancel: &CancellationToken,
) -> SegmentReport
where
    E: TranscodeExecutor + ?Sized,
{
    let job = TranscodeJob::for_segment(
        source,
        &segment,
        dimensions,
        &settings.output_dir,
        &settings.video_bitrate,
    );

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            TranscodeOutcome::Failed(format!("segment {} cancelled", segment.index))
        }
        outcome = run_with_timeout(executor, &job, settings.timeout) => outcome,
    };

    match &outcome {
        TranscodeOutcome::Produced(path) => {
            info!(segment = segment.index, output = %path.display(), "segment transcoded")
        }
        TranscodeOutcome::Failed(cause) => {
            error!(segment = segment.index, %cause, "segment failed")
        }
    }

    SegmentReport { segment, outcome }
}

async fn run_with_timeout<E>(
    executor: &E,
    job: &TranscodeJob,
    timeout: Option<Duration>,
) -> TranscodeOutcome
where
    E: TranscodeExecutor + ?Sized,
{
    let run = executor.run_ffmpeg_transcode(job);
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, run).await {
            Ok(result) => result,
            Err(_) => {
                return TranscodeOutcome::Failed(format!(
                    "segment {} timed out after {}s",
                    job.segment_index,
                    limit.as_secs_f64()
                ))
            }
        },
        None => run.await,
    };

    match result {
        Err(e) => TranscodeOutcome::Failed(format!(
            "ffmpeg command execution failed for segment {}: {}",
            job.segment_index, e
        )),
        Ok(output) if !output.status.success() => TranscodeOutcome::Failed(format!(
            "Error transcoding segment {}: {}",
            job.segment_index,
            stderr_tail(&output.stderr)
        )),
        Ok(_) => TranscodeOutcome::Produced(job.output_path.clone()),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let start = lines.len().saturating_sub(DIAGNOSTIC_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::engine::MockTranscodeExecutor;
    use std::io;
    use std::os::unix::process::ExitStatusExt;
    use std::process::{ExitStatus, Output};

    fn create_mock_std_output(stderr_str: &str, success: bool) -> Output {
        Output {
            status: if success {
                ExitStatus::from_raw(0)
            } else {
                ExitStatus::from_raw(1 << 8)
            },
            stdout: Vec::new(),
            stderr: stderr_str.as_bytes().to_vec(),
        }
    }

    fn segment(index: usize) -> Segment {
        Segment {
            index,
            start_seconds: index as f64 * 50.0,
            duration_seconds: 50.0,
        }
    }

    #[tokio::test]
    async fn test_transcode_segment_success() {
        let mut mock_runner = MockTranscodeExecutor::new();
        mock_runner
            .expect_run_ffmpeg_transcode()
            .withf(|job| {
                job.segment_index == 1
                    && job.start_time == 50.0
                    && job.duration == 50.0
                    && job.dimensions == Dimensions::new(1080, 1920)
                    && job.video_bitrate == "4000k"
                    && job.output_path == Path::new("out/clip_2.mp4")
            })
            .times(1)
            .returning(|_| Ok(create_mock_std_output("", true)));

        let report = transcode_segment(
            &mock_runner,
            Path::new("in.mp4"),
            segment(1),
            Dimensions::new(1080, 1920),
            &TranscodeSettings::new("out"),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(
            report.outcome,
            TranscodeOutcome::Produced(PathBuf::from("out/clip_2.mp4"))
        );
        assert_eq!(report.segment, segment(1));
    }

    #[tokio::test]
    async fn test_transcode_segment_engine_error_keeps_diagnostic() {
        let mut mock_runner = MockTranscodeExecutor::new();
        mock_runner
            .expect_run_ffmpeg_transcode()
            .times(1)
            .returning(|_| {
                Ok(create_mock_std_output(
                    "ffmpeg version 6.1\nbuilt with gcc\n\nInput #0\nStream mapping\nOutput #0\nUnknown encoder 'libx264'\n",
                    false,
                ))
            });

        let report = transcode_segment(
            &mock_runner,
            Path::new("in.mp4"),
            segment(0),
            Dimensions::new(480, 854),
            &TranscodeSettings::new("out"),
            &CancellationToken::new(),
        )
        .await;

        match report.outcome {
            TranscodeOutcome::Failed(cause) => {
                assert!(cause.contains("Error transcoding segment 0"));
                assert!(cause.contains("Unknown encoder 'libx264'"));
                assert!(!cause.contains("ffmpeg version"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transcode_segment_spawn_error() {
        let mut mock_runner = MockTranscodeExecutor::new();
        mock_runner
            .expect_run_ffmpeg_transcode()
            .times(1)
            .returning(|_| Err(io::Error::new(io::ErrorKind::NotFound, "ffmpeg not found")));

        let report = transcode_segment(
            &mock_runner,
            Path::new("in.mp4"),
            segment(3),
            Dimensions::new(480, 854),
            &TranscodeSettings::new("out"),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(report.outcome, TranscodeOutcome::Failed(ref c) if c.contains("ffmpeg not found")));
    }

    #[tokio::test]
    async fn test_transcode_segment_cancelled_before_start() {
        let mut mock_runner = MockTranscodeExecutor::new();
        mock_runner
            .expect_run_ffmpeg_transcode()
            .returning(|_| Ok(create_mock_std_output("", true)));

        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = transcode_segment(
            &mock_runner,
            Path::new("in.mp4"),
            segment(0),
            Dimensions::new(480, 854),
            &TranscodeSettings::new("out"),
            &cancel,
        )
        .await;

        assert!(matches!(report.outcome, TranscodeOutcome::Failed(ref c) if c.contains("cancelled")));
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr = b"a\nb\n\nc\nd\ne\nf\ng\n";
        assert_eq!(stderr_tail(stderr), "c\nd\ne\nf\ng");
        assert_eq!(stderr_tail(b""), "");
    }
}
