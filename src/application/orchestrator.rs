use super::probe::probe_duration;
use super::source::SourceVideo;
use super::transcode::{transcode_segment, TranscodeSettings};
use crate::domain::geometry::resolve;
use crate::domain::options::ProcessingOptions;
use crate::domain::outcome::{RunReport, SegmentReport, TranscodeOutcome};
use crate::domain::segments::plan;
use crate::error::Result;
use crate::ports::engine::TranscodeExecutor;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs uploaded sources through probe, plan and the parallel transcode
/// fan-out.
pub struct OrchestratorService<E> {
    executor: Arc<E>,
    settings: Arc<TranscodeSettings>,
    /// `None` lets every segment's engine run at once.
    max_concurrent: Option<usize>,
    /// Parent of the runs started since the last `cancel`.
    shutdown: Mutex<CancellationToken>,
}

impl<E> OrchestratorService<E>
where
    E: TranscodeExecutor + 'static,
{
    pub fn new(executor: E, settings: TranscodeSettings) -> Self {
        Self {
            executor: Arc::new(executor),
            settings: Arc::new(settings),
            max_concurrent: Some(num_cpus::get().max(1)),
            shutdown: Mutex::new(CancellationToken::new()),
        }
    }

    /// Caps the number of engine processes running at the same time.
    /// `0` removes the cap.
    pub fn with_max_concurrent(mut self, limit: usize) -> Self {
        self.max_concurrent = (limit > 0).then_some(limit);
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn settings(&self) -> &TranscodeSettings {
        &self.settings
    }

    pub fn max_concurrent(&self) -> Option<usize> {
        self.max_concurrent
    }

    /// Aborts every engine invocation still running or waiting in the runs
    /// in progress. Aborted segments report `Failed`; runs started afterwards
    /// are unaffected.
    pub fn cancel(&self) {
        let mut current = self.shutdown.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *current, CancellationToken::new()).cancel();
    }

    fn run_token(&self) -> CancellationToken {
        self.shutdown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .child_token()
    }

    /// Processes one staged source.
    ///
    /// Probe or planning errors return before any task is launched. Engine
    /// failures never cancel sibling segments: the report lists every
    /// outcome and the source is deleted only when all segments produced.
    pub async fn run(
        &self,
        source: &mut SourceVideo,
        options: &ProcessingOptions,
    ) -> Result<RunReport> {
        let duration = probe_duration(self.executor.as_ref(), source.path()).await?;
        source.set_duration(duration);

        let segments = plan(duration, options.segment_duration)?;
        let dimensions = resolve(options.quality, options.aspect_ratio);

        info!(
            source = %source.path().display(),
            duration,
            segments = segments.len(),
            %dimensions,
            "starting run"
        );

        let limiter = self.max_concurrent.map(|n| Arc::new(Semaphore::new(n)));
        let source_path: Arc<PathBuf> = Arc::new(source.path().to_path_buf());
        let cancel = self.run_token();
        let mut tasks = JoinSet::new();

        for segment in segments.iter().copied() {
            let executor = self.executor.clone();
            let settings = self.settings.clone();
            let source_path = source_path.clone();
            let limiter = limiter.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                // Held for the whole engine call.
                let _permit = match limiter {
                    Some(limiter) => match limiter.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(_) => {
                            return SegmentReport {
                                segment,
                                outcome: TranscodeOutcome::Failed(format!(
                                    "segment {} could not be scheduled",
                                    segment.index
                                )),
                            }
                        }
                    },
                    None => None,
                };
                transcode_segment(
                    executor.as_ref(),
                    &source_path,
                    segment,
                    dimensions,
                    &settings,
                    &cancel,
                )
                .await
            });
        }

        let mut completed = Vec::with_capacity(segments.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => completed.push(report),
                Err(e) => error!(error = %e, "transcode task panicked"),
            }
        }

        // A panicked task has no report; record it as failed so the run
        // can never look complete without it.
        let reported: HashSet<usize> = completed.iter().map(|r| r.segment.index).collect();
        for segment in &segments {
            if !reported.contains(&segment.index) {
                completed.push(SegmentReport {
                    segment: *segment,
                    outcome: TranscodeOutcome::Failed(format!(
                        "segment {} task aborted",
                        segment.index
                    )),
                });
            }
        }

        let report = RunReport::from_completion_order(completed);
        if report.is_success() {
            info!(segments = report.segments.len(), "run complete");
            source.cleanup().await;
        } else {
            let failed = report.failures().count();
            warn!(
                failed,
                produced = report.produced().count(),
                source = %source.path().display(),
                "run failed, keeping source"
            );
        }
        Ok(report)
    }
}
