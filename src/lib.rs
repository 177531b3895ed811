//! PressPlay turns a script and a handful of images into a narrated slideshow video.
//!
//! Every sentence of the script becomes a scene: a background image with a slow Ken-Burns zoom
//! and the sentence as a caption. Scenes share the narration length evenly, crossfade into each
//! other and are encoded with the narration into an MP4 (H.264 + AAC).
//!
//! - Describe the run with a [`GenerationRequest`] and a [`PipelineConfig`]
//! - Provide a [`SpeechSynthesizer`] ([`GoogleTranslateTts`] is built in)
//! - Call [`generate`] and keep the returned [`RenderedVideo`]
#![forbid(unsafe_code)]

mod assets;
mod foundation;

/// Encoding sinks.
pub mod encode;
pub(crate) mod pipeline;
pub(crate) mod render;
pub(crate) mod scene;
pub(crate) mod script;
pub(crate) mod speech;
pub(crate) mod timeline;

pub use crate::foundation::core::{Affine, Canvas, Fps, FrameIndex, FrameRange, Point, Rect};
pub use crate::foundation::error::{
    PressPlayError, PressPlayResult, SynthesisError, ValidationError,
};

pub use crate::assets::font::{CaptionFont, FontOrigin, resolve_caption_font};
pub use crate::assets::media::{
    is_ffmpeg_on_path, is_ffprobe_on_path, probe_duration_secs, require_ffmpeg_tools,
};
pub use crate::assets::pool::{ImagePool, ImageSource, pick_image};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::pipeline::config::{ENV_FONT, ENV_TTS_TLD, PipelineConfig};
pub use crate::pipeline::generate::{
    GenerateOpts, GenerationRequest, RenderedVideo, SUGGESTED_FILENAME, VideoMetadata, generate,
    generate_with_opts, plan_timeline, render_preview_frame,
};
pub use crate::render::frame::FrameRGBA;
pub use crate::render::pipeline::{RenderStats, RenderThreading};
pub use crate::scene::caption::CaptionStyle;
pub use crate::scene::transform::ZoomRange;
pub use crate::script::{NarrationUnit, narration_text, narration_units, split_sentences};
pub use crate::speech::google::{GoogleTranslateTts, GoogleTtsOpts};
pub use crate::speech::language::{BUILTIN_LANGUAGES, LanguageCode, LanguageSet};
pub use crate::speech::synth::{SpeechSynthesizer, SynthesizedSpeech};
pub use crate::timeline::assemble::{
    AudioSync, FrameSample, Scene, Timeline, TimelineOpts, allocate_durations, assemble,
};
