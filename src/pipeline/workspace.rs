use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{foundation::error::PressPlayResult, speech::synth::SynthesizedSpeech};

const DIR_PREFIX: &str = "pressplay-";

/// Private scratch directory holding one request's narration audio and output video.
///
/// Removed when dropped, on success and on every failure path. Files go in a fixed order:
/// narration audio first, then the (possibly partial) video, then the directory itself.
/// Decoded images live in memory and are released by the caller before the workspace drops.
#[derive(Debug)]
pub struct RequestWorkspace {
    dir: Option<tempfile::TempDir>,
    audio: Option<PathBuf>,
    video: Option<PathBuf>,
}

impl RequestWorkspace {
    /// Create a fresh directory under `root`, or under the system temp dir when `None`.
    pub fn create(root: Option<&Path>) -> PressPlayResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(DIR_PREFIX);
        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)
                    .with_context(|| format!("create workspace root '{}'", root.display()))?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .context("create request workspace")?;
        tracing::debug!(dir = %dir.path().display(), "request workspace created");
        Ok(Self {
            dir: Some(dir),
            audio: None,
            video: None,
        })
    }

    /// Workspace directory.
    pub fn path(&self) -> &Path {
        self.dir
            .as_ref()
            .map_or_else(|| Path::new(""), tempfile::TempDir::path)
    }

    /// Write the narration audio as `narration.<ext>` and return its path.
    pub fn write_audio(&mut self, speech: &SynthesizedSpeech) -> PressPlayResult<PathBuf> {
        let path = self
            .path()
            .join(format!("narration.{}", speech.extension.to_ascii_lowercase()));
        std::fs::write(&path, &speech.bytes)
            .with_context(|| format!("write narration audio '{}'", path.display()))?;
        self.audio = Some(path.clone());
        Ok(path)
    }

    /// Path the encoder writes the video to.
    pub fn video_path(&mut self) -> PathBuf {
        let path = self.path().join("video.mp4");
        self.video = Some(path.clone());
        path
    }

    /// Remove everything now, reporting failures instead of swallowing them.
    pub fn close(mut self) -> PressPlayResult<()> {
        self.remove_files();
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            dir.close()
                .with_context(|| format!("remove workspace '{}'", path.display()))?;
        }
        Ok(())
    }

    fn remove_files(&mut self) {
        for path in [self.audio.take(), self.video.take()].into_iter().flatten() {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::trace!(path = %path.display(), "workspace file removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "workspace file not removed")
                }
            }
        }
    }
}

impl Drop for RequestWorkspace {
    fn drop(&mut self) {
        self.remove_files();
        // TempDir removes the directory when it drops.
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/workspace.rs"]
mod tests;
