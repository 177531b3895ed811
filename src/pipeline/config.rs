use std::{collections::BTreeMap, path::Path, path::PathBuf};

use anyhow::Context as _;

use crate::{
    foundation::{
        core::{Canvas, Fps},
        error::{PressPlayError, PressPlayResult},
    },
    render::pipeline::RenderThreading,
    scene::{caption::CaptionStyle, transform::ZoomRange},
    speech::{google::GoogleTtsOpts, language::LanguageSet},
    timeline::assemble::{AudioSync, TimelineOpts},
};

/// Environment variable overriding [`PipelineConfig::font_path`].
pub const ENV_FONT: &str = "PRESSPLAY_FONT";
/// Environment variable overriding the Google TTS host suffix.
pub const ENV_TTS_TLD: &str = "PRESSPLAY_TTS_TLD";

/// Every knob of a generation run. All fields have defaults, so `{}` is a valid config file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Output frame size.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Crossfade between consecutive scenes, in seconds.
    pub crossfade_secs: f64,
    /// Ken-Burns zoom range.
    pub zoom: ZoomRange,
    /// Caption look and placement.
    pub caption: CaptionStyle,
    /// Color behind transparent image padding (RGBA8).
    pub bg_rgba: [u8; 4],
    /// Audio/video reconciliation policy.
    pub audio_sync: AudioSync,
    /// Frame rendering parallelism.
    pub threading: RenderThreading,
    /// Caption font file; system fonts are searched when unset.
    pub font_path: Option<PathBuf>,
    /// `libx264` constant rate factor (0-51).
    pub crf: u8,
    /// Google TTS connection options.
    pub tts: GoogleTtsOpts,
    /// Additional language codes (code -> display name) accepted for narration.
    pub extra_languages: BTreeMap<String, String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::HD_720,
            fps: Fps { num: 24, den: 1 },
            crossfade_secs: 0.5,
            zoom: ZoomRange::default(),
            caption: CaptionStyle::default(),
            bg_rgba: [0, 0, 0, 255],
            audio_sync: AudioSync::default(),
            threading: RenderThreading::default(),
            font_path: None,
            crf: 23,
            tts: GoogleTtsOpts::default(),
            extra_languages: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON config document.
    pub fn from_json_str(json: &str) -> PressPlayResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| PressPlayError::config(format!("config json: {e}")))
    }

    /// Read and parse a JSON config file.
    pub fn from_path(path: &Path) -> PressPlayResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Apply `PRESSPLAY_FONT` / `PRESSPLAY_TTS_TLD` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides read through `lookup`; empty values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(font) = non_empty(ENV_FONT) {
            self.font_path = Some(PathBuf::from(font));
        }
        if let Some(tld) = non_empty(ENV_TTS_TLD) {
            self.tts.tld = tld.trim().to_owned();
        }
    }

    /// Reject values the pipeline cannot honor.
    pub fn validate(&self) -> PressPlayResult<()> {
        let Canvas { width, height } = self.canvas;
        if width == 0 || height == 0 {
            return Err(PressPlayError::config("canvas width/height must be > 0"));
        }
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(PressPlayError::config(
                "canvas width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(PressPlayError::config("canvas width/height must fit in u16"));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        if !self.crossfade_secs.is_finite() || self.crossfade_secs < 0.0 {
            return Err(PressPlayError::config(
                "crossfade_secs must be a finite, non-negative number",
            ));
        }
        let ZoomRange { from, to } = self.zoom;
        if !from.is_finite() || !to.is_finite() || from < 1.0 || to < 1.0 {
            return Err(PressPlayError::config(
                "zoom factors must be finite and >= 1.0 so the image always covers the frame",
            ));
        }
        self.caption.validate(self.canvas)?;
        if self.threading.threads == Some(0) {
            return Err(PressPlayError::config(
                "threading.threads must be >= 1 when set",
            ));
        }
        if self.crf > 51 {
            return Err(PressPlayError::config("crf must be in 0..=51"));
        }
        if self.tts.tld.trim().is_empty() {
            return Err(PressPlayError::config("tts.tld must not be empty"));
        }
        Ok(())
    }

    /// Built-in languages plus `extra_languages`.
    pub fn languages(&self) -> LanguageSet {
        self.extra_languages
            .iter()
            .fold(LanguageSet::builtin(), |set, (code, name)| {
                set.with_language(code, name)
            })
    }

    /// Timing options for the timeline assembler.
    pub fn timeline_opts(&self) -> TimelineOpts {
        TimelineOpts {
            crossfade_secs: self.crossfade_secs,
            fps: self.fps,
            audio_sync: self.audio_sync,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/config.rs"]
mod tests;
