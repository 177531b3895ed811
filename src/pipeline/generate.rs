//! End-to-end generation: validate, synthesize, compose, encode, clean up.

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::Context as _;

use crate::{
    assets::{
        decode::PreparedImage,
        font::resolve_caption_font,
        media::{probe_duration_secs, require_ffmpeg_tools},
        pool::{ImagePool, ImageSource},
    },
    encode::{
        ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir},
        sink::{AudioInputConfig, SinkConfig},
    },
    foundation::error::{PressPlayError, PressPlayResult, SynthesisError, ValidationError},
    pipeline::{config::PipelineConfig, workspace::RequestWorkspace},
    render::{frame::FrameRGBA, pipeline::render_timeline},
    scene::{
        composer::{SceneComposer, ScenePlan},
        transform::prepare_background,
    },
    script::{NarrationUnit, narration_text, narration_units},
    speech::synth::SpeechSynthesizer,
    timeline::assemble::{AudioSync, Timeline, assemble},
};

/// File name offered to whoever stores the result.
pub const SUGGESTED_FILENAME: &str = "pressplay_video.mp4";

/// One narrated slideshow to produce.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    /// Script; every sentence becomes a scene.
    pub text: String,
    /// Background images, cycled across scenes.
    pub images: Vec<ImageSource>,
    /// Narration language code, e.g. `hi`.
    pub language: String,
}

impl GenerationRequest {
    /// Build a request.
    pub fn new(
        text: impl Into<String>,
        images: Vec<ImageSource>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            images,
            language: language.into(),
        }
    }
}

/// Per-call controls that are not part of the request itself.
#[derive(Clone, Debug, Default)]
pub struct GenerateOpts {
    /// Set to `true` from another thread to abandon the run between render chunks.
    pub cancel: Option<Arc<AtomicBool>>,
    /// Directory under which the request workspace is created (system temp dir when `None`).
    pub workspace_root: Option<PathBuf>,
}

/// Describes the produced MP4.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct VideoMetadata {
    /// Container format (`mp4`).
    pub container: String,
    /// Video codec name (`h264`).
    pub video_codec: String,
    /// Audio codec name (`aac`).
    pub audio_codec: String,
    /// Output frame rate.
    pub fps: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Video track length.
    pub duration_secs: f64,
    /// Narration length.
    pub audio_secs: f64,
    /// One scene per narration unit.
    pub scene_count: usize,
    /// Frames pushed to the encoder, held tail included.
    pub frame_count: u64,
    /// Effective crossfade after clamping.
    pub crossfade_secs: f64,
    /// How the video length was reconciled with the narration.
    pub audio_sync: AudioSync,
    /// Narration language code as resolved.
    pub language: String,
}

/// Finished video, owned by the caller.
#[derive(Clone, Debug)]
pub struct RenderedVideo {
    /// Encoded MP4 bytes.
    pub bytes: Vec<u8>,
    /// Always [`SUGGESTED_FILENAME`].
    pub suggested_filename: String,
    pub metadata: VideoMetadata,
}

impl RenderedVideo {
    /// Write the MP4 to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> PressPlayResult<()> {
        ensure_parent_dir(path)?;
        std::fs::write(path, &self.bytes)
            .with_context(|| format!("write video '{}'", path.display()))?;
        Ok(())
    }
}

/// Produce a narrated slideshow for `request`.
pub fn generate(
    request: &GenerationRequest,
    synthesizer: &dyn SpeechSynthesizer,
    config: &PipelineConfig,
) -> PressPlayResult<RenderedVideo> {
    generate_with_opts(request, synthesizer, config, &GenerateOpts::default())
}

/// [`generate`] with cancellation and workspace placement.
///
/// Everything acquired for the request is released on every exit path: decoded images first,
/// then the narration audio, then the partial video and its workspace.
#[tracing::instrument(
    level = "info",
    skip_all,
    fields(language = %request.language, images = request.images.len())
)]
pub fn generate_with_opts(
    request: &GenerationRequest,
    synthesizer: &dyn SpeechSynthesizer,
    config: &PipelineConfig,
    opts: &GenerateOpts,
) -> PressPlayResult<RenderedVideo> {
    config.validate()?;
    let (pool, units) = validate_request(&request.text, &request.images)?;
    tracing::info!(scenes = units.len(), "script split");

    // Locals drop in reverse order, so `workspace` outlives the audio and the images.
    let mut workspace = RequestWorkspace::create(opts.workspace_root.as_deref())?;

    let speech = {
        let _step = tracing::info_span!("synthesize_audio").entered();
        let language = config.languages().resolve(&request.language)?;
        let speech = synthesizer.synthesize(&narration_text(&units), &language)?;
        speech.validate()?;
        speech
    };
    let audio_path = workspace.write_audio(&speech)?;
    require_ffmpeg_tools()?;
    let audio_secs = match speech.duration_secs {
        Some(secs) => secs,
        None => measure_narration(&audio_path)?,
    };
    tracing::info!(audio_secs, "narration ready");
    check_cancel(opts)?;

    let timeline = assemble(&units, pool.len(), audio_secs, config.timeline_opts())?;

    let images = {
        let _step = tracing::info_span!("load_images").entered();
        prepare_images(&pool, timeline.scenes.len(), config)?
    };
    check_cancel(opts)?;

    let (composer, plans) = {
        let _step = tracing::info_span!("compose_scenes").entered();
        let font = resolve_caption_font(config.font_path.as_deref())?;
        tracing::debug!(family = %font.family, "caption font resolved");
        let mut composer = SceneComposer::new(
            config.canvas,
            config.caption.clone(),
            config.zoom,
            config.bg_rgba,
            &font,
        )?;
        let plans = plan_scenes(&mut composer, &timeline, &images)?;
        (composer, plans)
    };

    let video_path = workspace.video_path();
    let stats = {
        let _step = tracing::info_span!("assemble_video").entered();
        let mut sink = FfmpegSink::new(FfmpegSinkOpts {
            out_path: video_path.clone(),
            overwrite: true,
            bg_rgba: config.bg_rgba,
            crf: config.crf,
        });
        let sink_cfg = SinkConfig {
            width: config.canvas.width,
            height: config.canvas.height,
            fps: config.fps,
            audio: Some(AudioInputConfig {
                path: audio_path.clone(),
            }),
        };
        render_timeline(
            &timeline,
            &plans,
            &composer.painter_settings(),
            &mut sink,
            sink_cfg,
            &config.threading,
            opts.cancel.as_deref(),
        )?
    };

    let bytes = std::fs::read(&video_path)
        .with_context(|| format!("read encoded video '{}'", video_path.display()))?;
    let metadata = VideoMetadata {
        container: "mp4".to_owned(),
        video_codec: "h264".to_owned(),
        audio_codec: "aac".to_owned(),
        fps: config.fps.as_f64(),
        width: config.canvas.width,
        height: config.canvas.height,
        duration_secs: timeline.output_secs(),
        audio_secs,
        scene_count: timeline.scenes.len(),
        frame_count: stats.frames_total,
        crossfade_secs: timeline.crossfade_secs,
        audio_sync: timeline.audio_sync,
        language: request.language.trim().to_ascii_lowercase(),
    };

    drop(plans);
    drop(images);
    drop(speech);
    workspace.close()?;

    tracing::info!(
        bytes = bytes.len(),
        frames = stats.frames_total,
        rendered = stats.frames_rendered,
        "video generated"
    );
    Ok(RenderedVideo {
        bytes,
        suggested_filename: SUGGESTED_FILENAME.to_owned(),
        metadata,
    })
}

/// Timeline `text` would produce over `image_count` images and `audio_secs` of narration.
pub fn plan_timeline(
    text: &str,
    image_count: usize,
    audio_secs: f64,
    config: &PipelineConfig,
) -> PressPlayResult<Timeline> {
    config.validate()?;
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyScript.into());
    }
    if image_count == 0 {
        return Err(ValidationError::NoImages.into());
    }
    let units = narration_units(text);
    if units.is_empty() {
        return Err(ValidationError::NoSentences.into());
    }
    assemble(&units, image_count, audio_secs, config.timeline_opts())
}

/// Render one frame of scene `scene_index` at `at_secs` into the scene, without narration.
///
/// Every scene is given `scene_secs`, so no speech service or `ffmpeg` is needed.
pub fn render_preview_frame(
    text: &str,
    images: Vec<ImageSource>,
    config: &PipelineConfig,
    scene_index: usize,
    at_secs: f64,
    scene_secs: f64,
) -> PressPlayResult<FrameRGBA> {
    config.validate()?;
    let (pool, units) = validate_request(text, &images)?;
    let timeline = assemble(
        &units,
        pool.len(),
        scene_secs * units.len() as f64,
        config.timeline_opts(),
    )?;
    let scene = timeline.scenes.get(scene_index).ok_or_else(|| {
        PressPlayError::config(format!(
            "scene {scene_index} out of range (script has {} scenes)",
            timeline.scenes.len()
        ))
    })?;

    let background = prepare_one(pool.pick(scene_index), scene.image_index, config)?;
    let font = resolve_caption_font(config.font_path.as_deref())?;
    let mut composer = SceneComposer::new(
        config.canvas,
        config.caption.clone(),
        config.zoom,
        config.bg_rgba,
        &font,
    )?;
    let plan = composer.plan_scene(
        scene_index,
        &scene.unit.text,
        &background,
        scene.duration_secs,
    )?;
    composer.render_frame(&plan, at_secs)
}

fn validate_request(
    text: &str,
    images: &[ImageSource],
) -> PressPlayResult<(ImagePool, Vec<NarrationUnit>)> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyScript.into());
    }
    let pool = ImagePool::new(images.to_vec())?;
    let units = narration_units(text);
    if units.is_empty() {
        return Err(ValidationError::NoSentences.into());
    }
    Ok((pool, units))
}

fn check_cancel(opts: &GenerateOpts) -> PressPlayResult<()> {
    if opts
        .cancel
        .as_ref()
        .is_some_and(|c| c.load(Ordering::Relaxed))
    {
        return Err(PressPlayError::Cancelled);
    }
    Ok(())
}

// ffprobe rejecting the file means the service returned something that is not audio.
fn measure_narration(path: &Path) -> PressPlayResult<f64> {
    probe_duration_secs(path).map_err(|e| match e {
        PressPlayError::Render(msg) => SynthesisError::InvalidAudio(msg).into(),
        other => other,
    })
}

// Only the images some scene actually uses are decoded; index i is pool image i.
fn prepare_images(
    pool: &ImagePool,
    scene_count: usize,
    config: &PipelineConfig,
) -> PressPlayResult<Vec<PreparedImage>> {
    pool.as_slice()
        .iter()
        .take(scene_count)
        .enumerate()
        .map(|(i, source)| prepare_one(source, i, config))
        .collect()
}

fn prepare_one(
    source: &ImageSource,
    pool_index: usize,
    config: &PipelineConfig,
) -> PressPlayResult<PreparedImage> {
    let bytes = source.load_bytes()?;
    let prepared = prepare_background(&bytes, config.canvas).map_err(|e| match e {
        PressPlayError::Render(msg) => {
            PressPlayError::render(format!("image {pool_index} ({}): {msg}", source.label()))
        }
        other => other,
    })?;
    tracing::debug!(image = pool_index, source = %source.label(), "background prepared");
    Ok(prepared)
}

fn plan_scenes(
    composer: &mut SceneComposer,
    timeline: &Timeline,
    images: &[PreparedImage],
) -> PressPlayResult<Vec<ScenePlan>> {
    timeline
        .scenes
        .iter()
        .enumerate()
        .map(|(i, scene)| {
            let background = images.get(scene.image_index).ok_or_else(|| {
                PressPlayError::render(format!(
                    "scene {i} uses image {} but only {} were prepared",
                    scene.image_index,
                    images.len()
                ))
            })?;
            composer.plan_scene(i, &scene.unit.text, background, scene.duration_secs)
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/generate.rs"]
mod tests;
