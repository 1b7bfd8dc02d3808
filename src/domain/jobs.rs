use super::geometry::Dimensions;
use super::segments::Segment;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// One engine invocation: cut a time range out of the source, fit it into
/// `dimensions` and write it to `output_path`.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeJob {
    pub segment_index: usize,
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub start_time: f64,
    pub duration: f64,
    pub dimensions: Dimensions,
    /// ffmpeg bitrate notation, e.g. `4000k`
    pub video_bitrate: String,
}

impl TranscodeJob {
    pub fn for_segment(
        source_path: &Path,
        segment: &Segment,
        dimensions: Dimensions,
        output_dir: &Path,
        video_bitrate: &str,
    ) -> Self {
        Self {
            segment_index: segment.index,
            source_path: source_path.to_path_buf(),
            output_path: output_dir.join(segment.clip_file_name()),
            start_time: segment.start_seconds,
            duration: segment.duration_seconds,
            dimensions,
            video_bitrate: video_bitrate.to_string(),
        }
    }

    /// Arguments handed to `ffmpeg`. Seeking before `-i` keeps extraction
    /// fast on long sources.
    pub fn ffmpeg_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-y".into(),
            "-ss".into(),
            self.start_time.to_string().into(),
            "-i".into(),
            self.source_path.clone().into_os_string(),
            "-t".into(),
            self.duration.to_string().into(),
        ];
        args.extend(
            [
                "-vf".to_string(),
                self.dimensions.filter_chain(),
                "-s".to_string(),
                self.dimensions.to_string(),
                "-b:v".to_string(),
                self.video_bitrate.clone(),
            ]
            .map(OsString::from),
        );
        args.push(self.output_path.clone().into_os_string());
        args
    }
}
