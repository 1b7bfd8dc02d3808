use crate::error::{PipelineError, Result};
use serde::Serialize;

/// Upper bound on segments per run, whatever duration the probe reports.
pub const MAX_SEGMENTS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    /// 0-based position in the run
    pub index: usize,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

impl Segment {
    /// 1-based number used to name the output clip.
    pub fn clip_number(&self) -> usize {
        self.index + 1
    }

    pub fn clip_file_name(&self) -> String {
        format!("clip_{}.mp4", self.clip_number())
    }
}

/// Cuts `[0, total_seconds)` into `ceil(total / length)` back-to-back
/// segments of `segment_length` seconds.
///
/// The last segment still requests the full length; the engine stops at end
/// of stream.
pub fn plan(total_seconds: f64, segment_length: u32) -> Result<Vec<Segment>> {
    if !total_seconds.is_finite() || total_seconds <= 0.0 {
        return Err(PipelineError::InvalidInput(format!(
            "video duration must be positive (got {})",
            total_seconds
        )));
    }
    if segment_length == 0 {
        return Err(PipelineError::InvalidInput(
            "segment length must be at least 1 second".to_string(),
        ));
    }

    let length = f64::from(segment_length);
    let count = (total_seconds / length).ceil();
    if count > MAX_SEGMENTS as f64 {
        return Err(PipelineError::InvalidInput(format!(
            "{}s at {}s per segment exceeds the limit of {} segments",
            total_seconds, segment_length, MAX_SEGMENTS
        )));
    }

    Ok((0..count as usize)
        .map(|index| Segment {
            index,
            start_seconds: index as f64 * length,
            duration_seconds: length,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(segments: &[Segment]) -> Vec<f64> {
        segments.iter().map(|s| s.start_seconds).collect()
    }

    #[test]
    fn test_plan_with_remainder() {
        let segments = plan(125.0, 50).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(starts(&segments), vec![0.0, 50.0, 100.0]);
        assert!(segments.iter().all(|s| s.duration_seconds == 50.0));
    }

    #[test]
    fn test_plan_exact_multiple_has_no_trailing_segment() {
        let segments = plan(100.0, 50).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(starts(&segments), vec![0.0, 50.0]);
    }

    #[test]
    fn test_plan_shorter_than_one_segment() {
        let segments = plan(12.3, 50).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_seconds, 0.0);
        assert_eq!(segments[0].duration_seconds, 50.0);
    }

    #[test]
    fn test_plan_invariants() {
        for (total, length) in [(1.0, 1), (59.97, 7), (3600.5, 50), (0.01, 3), (101.0, 10)] {
            let segments = plan(total, length).unwrap();
            assert_eq!(segments.len(), (total / f64::from(length)).ceil() as usize);
            assert_eq!(segments[0].start_seconds, 0.0);
            for pair in segments.windows(2) {
                assert_eq!(pair[1].start_seconds - pair[0].start_seconds, f64::from(length));
                assert_eq!(pair[1].index, pair[0].index + 1);
            }
            let last = segments.last().unwrap();
            assert!(last.start_seconds < total);
            assert!(last.start_seconds + last.duration_seconds >= total);
        }
    }

    #[test]
    fn test_plan_rejects_bad_input() {
        assert!(matches!(plan(0.0, 50), Err(PipelineError::InvalidInput(_))));
        assert!(matches!(plan(-3.0, 50), Err(PipelineError::InvalidInput(_))));
        assert!(matches!(plan(f64::NAN, 50), Err(PipelineError::InvalidInput(_))));
        assert!(matches!(plan(10.0, 0), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_plan_rejects_too_many_segments() {
        assert!(matches!(plan(1.0e18, 1), Err(PipelineError::InvalidInput(_))));
        assert!(matches!(plan(f64::MAX, 1), Err(PipelineError::InvalidInput(_))));

        let limit = MAX_SEGMENTS as f64;
        assert_eq!(plan(limit, 1).unwrap().len(), MAX_SEGMENTS);
        assert!(matches!(plan(limit + 0.5, 1), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_clip_names_are_one_based() {
        let segments = plan(20.0, 10).unwrap();
        assert_eq!(segments[0].clip_file_name(), "clip_1.mp4");
        assert_eq!(segments[1].clip_file_name(), "clip_2.mp4");
    }
}
