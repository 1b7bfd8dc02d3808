//! Configuration from environment variables (and an optional `.env` file).

use crate::application::source::DEFAULT_MAX_UPLOAD_BYTES;
use crate::application::transcode::{TranscodeSettings, DEFAULT_VIDEO_BITRATE};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

const DEFAULT_TIMEOUT_SECS: u64 = 900;

#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Where uploads are staged
    pub upload_dir: PathBuf,
    /// Where clips are written
    pub output_dir: PathBuf,
    pub max_upload_bytes: u64,
    /// ffmpeg bitrate notation
    pub video_bitrate: String,
    /// 0 means unbounded
    pub max_concurrent_transcodes: usize,
    /// `None` disables the per-segment timeout
    pub transcode_timeout: Option<Duration>,
    pub ffmpeg_bin: PathBuf,
    pub ffprobe_bin: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Missing keys take their
    /// default; unparsable numbers are logged and take their default too.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let max_upload_mb: u64 = parse_or(&lookup, "MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_BYTES / (1024 * 1024));
        let timeout_secs: u64 = parse_or(&lookup, "TRANSCODE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);

        Self {
            addr: string("ADDR", "127.0.0.1"),
            port: string("PORT", "3000"),
            upload_dir: PathBuf::from(string("UPLOAD_DIR", "uploads")),
            output_dir: PathBuf::from(string("OUTPUT_DIR", "output")),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            video_bitrate: string("VIDEO_BITRATE", DEFAULT_VIDEO_BITRATE),
            max_concurrent_transcodes: parse_or(&lookup, "MAX_CONCURRENT_TRANSCODES", num_cpus::get()),
            transcode_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            ffmpeg_bin: PathBuf::from(string("FFMPEG_BIN", "ffmpeg")),
            ffprobe_bin: PathBuf::from(string("FFPROBE_BIN", "ffprobe")),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    pub fn transcode_settings(&self) -> TranscodeSettings {
        TranscodeSettings {
            output_dir: self.output_dir.clone(),
            video_bitrate: self.video_bitrate.clone(),
            timeout: self.transcode_timeout,
        }
    }

    /// Creates the upload and output directories if they are missing.
    /// Called once by the binary before serving.
    pub async fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [&self.upload_dir, &self.output_dir] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring unparsable setting");
            default
        }),
    }
}
