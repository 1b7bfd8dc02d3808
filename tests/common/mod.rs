#![allow(dead_code)]

use async_trait::async_trait;
use reelsplit::domain::jobs::TranscodeJob;
use reelsplit::ports::engine::TranscodeExecutor;
use std::collections::HashSet;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{ExitStatus, Output};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn create_mock_std_output(stdout_str: &str, stderr_str: &str, success: bool) -> Output {
    Output {
        status: if success {
            ExitStatus::from_raw(0)
        } else {
            ExitStatus::from_raw(1 << 8)
        },
        stdout: stdout_str.as_bytes().to_vec(),
        stderr: stderr_str.as_bytes().to_vec(),
    }
}

/// Scripted engine: reports a fixed duration, writes a small clip file for
/// every successful segment and fails the segments it was told to fail.
#[derive(Default)]
pub struct FakeExecutor {
    pub duration: Option<f64>,
    pub failing: HashSet<usize>,
    pub hanging: HashSet<usize>,
    pub delay: Duration,
    pub calls: AtomicUsize,
    running: AtomicUsize,
    pub max_running: AtomicUsize,
    pub jobs: Mutex<Vec<TranscodeJob>>,
}

impl FakeExecutor {
    pub fn with_duration(seconds: f64) -> Self {
        Self {
            duration: Some(seconds),
            ..Self::default()
        }
    }

    pub fn failing(mut self, index: usize) -> Self {
        self.failing.insert(index);
        self
    }

    pub fn hanging(mut self, index: usize) -> Self {
        self.hanging.insert(index);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscodeExecutor for FakeExecutor {
    async fn run_ffmpeg_transcode(&self, job: &TranscodeJob) -> io::Result<Output> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.jobs.lock().unwrap().push(job.clone());

        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);

        if self.hanging.contains(&job.segment_index) {
            std::future::pending::<()>().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.running.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&job.segment_index) {
            return Ok(create_mock_std_output(
                "",
                &format!("{}: Invalid data found when processing input", job.source_path.display()),
                false,
            ));
        }
        tokio::fs::write(&job.output_path, b"clip").await?;
        Ok(create_mock_std_output("", "", true))
    }

    async fn run_ffprobe_for_duration(&self, _media_path: &Path) -> io::Result<Output> {
        Ok(match self.duration {
            Some(seconds) => create_mock_std_output(&format!("{}\n", seconds), "", true),
            None => create_mock_std_output("", "Invalid data found when processing input", false),
        })
    }
}
