use std::{path::Path, process::Command, process::Stdio};

use crate::foundation::error::{PressPlayError, PressPlayResult};

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    tool_runs("ffmpeg")
}

/// Return `true` when `ffprobe` can be invoked from `PATH`.
pub fn is_ffprobe_on_path() -> bool {
    tool_runs("ffprobe")
}

/// Fail with [`PressPlayError::RenderDependency`] unless both `ffmpeg` and `ffprobe` exist.
pub fn require_ffmpeg_tools() -> PressPlayResult<()> {
    if !is_ffmpeg_on_path() {
        return Err(PressPlayError::render_dependency(
            "ffmpeg is required for MP4 encoding, but was not found on PATH",
        ));
    }
    if !is_ffprobe_on_path() {
        return Err(PressPlayError::render_dependency(
            "ffprobe is required to measure narration length, but was not found on PATH",
        ));
    }
    Ok(())
}

fn tool_runs(name: &str) -> bool {
    Command::new(name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Measure the duration of an audio (or any media) file in seconds with `ffprobe`.
pub fn probe_duration_secs(source_path: &Path) -> PressPlayResult<f64> {
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format"])
        .arg(source_path)
        .output()
        .map_err(|e| {
            PressPlayError::render_dependency(format!("failed to run ffprobe: {e}"))
        })?;
    if !out.status.success() {
        return Err(PressPlayError::render(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| PressPlayError::render(format!("ffprobe json parse failed: {e}")))?;
    parse_duration(parsed.format.and_then(|f| f.duration).as_deref()).ok_or_else(|| {
        PressPlayError::render(format!(
            "ffprobe reported no usable duration for '{}'",
            source_path.display()
        ))
    })
}

fn parse_duration(raw: Option<&str>) -> Option<f64> {
    let secs = raw?.trim().parse::<f64>().ok()?;
    (secs.is_finite() && secs > 0.0).then_some(secs)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
