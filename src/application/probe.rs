use crate::error::{PipelineError, Result};
use crate::ports::engine::TranscodeExecutor;
use std::path::Path;

/// Total duration in seconds of the media at `path`, as reported by the
/// engine's probe.
pub async fn probe_duration<E>(executor: &E, path: &Path) -> Result<f64>
where
    E: TranscodeExecutor + ?Sized,
{
    let output = executor
        .run_ffprobe_for_duration(path)
        .await
        .map_err(|e| PipelineError::ProbeFailure(format!("could not run ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(PipelineError::ProbeFailure(format!(
            "ffprobe error for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let raw = stdout.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    let duration = raw.parse::<f64>().map_err(|_| {
        PipelineError::ProbeFailure(format!("unreadable duration {:?} for {}", raw, path.display()))
    })?;

    if !duration.is_finite() || duration <= 0.0 {
        return Err(PipelineError::ProbeFailure(format!(
            "non-positive duration {} for {}",
            duration,
            path.display()
        )));
    }
    Ok(duration)
}
