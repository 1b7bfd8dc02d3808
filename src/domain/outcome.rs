use super::segments::Segment;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result of a single segment's transcode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TranscodeOutcome {
    Produced(PathBuf),
    Failed(String),
}

impl TranscodeOutcome {
    pub fn is_produced(&self) -> bool {
        matches!(self, TranscodeOutcome::Produced(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentReport {
    pub segment: Segment,
    pub outcome: TranscodeOutcome,
}

/// Aggregate verdict of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    Success(usize),
    Failure(String),
}

/// Every segment outcome of a run, ordered by segment index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunReport {
    pub segments: Vec<SegmentReport>,
    /// Index of the failure that completed first, if any.
    pub first_failure: Option<usize>,
}

impl RunReport {
    /// Sorts by segment index; `completion_order` is the order reports came
    /// back from the tasks.
    pub fn from_completion_order(completion_order: Vec<SegmentReport>) -> Self {
        let first_failure = completion_order
            .iter()
            .find(|report| !report.outcome.is_produced())
            .map(|report| report.segment.index);

        let mut segments = completion_order;
        segments.sort_by_key(|report| report.segment.index);

        Self {
            segments,
            first_failure,
        }
    }

    pub fn is_success(&self) -> bool {
        self.segments.iter().all(|report| report.outcome.is_produced())
    }

    pub fn result(&self) -> RunResult {
        let cause = self.first_failure.and_then(|index| {
            self.segments
                .iter()
                .find(|report| report.segment.index == index)
                .and_then(|report| match &report.outcome {
                    TranscodeOutcome::Failed(cause) => Some(cause.clone()),
                    TranscodeOutcome::Produced(_) => None,
                })
        });

        match cause {
            Some(cause) => RunResult::Failure(cause),
            None if self.is_success() => RunResult::Success(self.segments.len()),
            // first_failure not pointing at a failed report; fall back to index order
            None => RunResult::Failure(
                self.failures()
                    .next()
                    .map(|(_, cause)| cause.to_string())
                    .unwrap_or_default(),
            ),
        }
    }

    pub fn produced(&self) -> impl Iterator<Item = &Path> {
        self.segments.iter().filter_map(|report| match &report.outcome {
            TranscodeOutcome::Produced(path) => Some(path.as_path()),
            TranscodeOutcome::Failed(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Segment, &str)> {
        self.segments.iter().filter_map(|report| match &report.outcome {
            TranscodeOutcome::Failed(cause) => Some((&report.segment, cause.as_str())),
            TranscodeOutcome::Produced(_) => None,
        })
    }
}
