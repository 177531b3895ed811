use std::sync::atomic::AtomicUsize;

use super::*;
use crate::{
    assets::media::is_ffmpeg_on_path,
    speech::{language::LanguageCode, synth::SynthesizedSpeech},
};

/// Returns a fixed result and counts calls.
struct ScriptedSynth {
    result: Result<SynthesizedSpeech, SynthesisError>,
    calls: AtomicUsize,
}

impl ScriptedSynth {
    fn ok(bytes: Vec<u8>, duration_secs: Option<f64>) -> Self {
        Self {
            result: Ok(SynthesizedSpeech {
                bytes,
                extension: "mp3".to_owned(),
                duration_secs,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(err: SynthesisError) -> Self {
        Self {
            result: Err(err),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SpeechSynthesizer for ScriptedSynth {
    fn synthesize(
        &self,
        _text: &str,
        _language: &LanguageCode,
    ) -> Result<SynthesizedSpeech, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(8, 6, image::Rgba([10, 20, 30, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn request(text: &str, images: usize, language: &str) -> GenerationRequest {
    GenerationRequest::new(
        text,
        (0..images).map(|_| ImageSource::from(png_bytes())).collect(),
        language,
    )
}

fn opts_in(root: &Path) -> GenerateOpts {
    GenerateOpts {
        cancel: None,
        workspace_root: Some(root.to_path_buf()),
    }
}

fn leftovers(root: &Path) -> usize {
    std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
}

#[test]
fn validation_runs_in_order_before_synthesis() {
    let synth = ScriptedSynth::ok(vec![1], Some(1.0));
    let cfg = PipelineConfig::default();

    let err = generate(&request("   \n\t", 0, "en"), &synth, &cfg).unwrap_err();
    assert!(matches!(
        err,
        PressPlayError::Validation(ValidationError::EmptyScript)
    ));

    let err = generate(&request("Hello world.", 0, "en"), &synth, &cfg).unwrap_err();
    assert!(matches!(
        err,
        PressPlayError::Validation(ValidationError::NoImages)
    ));

    let mut bad = PipelineConfig::default();
    bad.canvas.width = 0;
    let err = generate(&request("Hello world.", 1, "en"), &synth, &bad).unwrap_err();
    assert!(err.is_validation());

    assert_eq!(synth.calls(), 0);
}

#[test]
fn unsupported_language_fails_without_calling_the_service() {
    let root = tempfile::tempdir().unwrap();
    let synth = ScriptedSynth::ok(vec![1], Some(1.0));
    let err = generate_with_opts(
        &request("Hello world.", 1, "xx"),
        &synth,
        &PipelineConfig::default(),
        &opts_in(root.path()),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PressPlayError::Synthesis(SynthesisError::UnsupportedLanguage { ref code }) if code == "xx"
    ));
    assert_eq!(synth.calls(), 0);
    assert_eq!(leftovers(root.path()), 0);
}

#[test]
fn synthesis_failures_abort_and_clean_up() {
    let root = tempfile::tempdir().unwrap();
    let cfg = PipelineConfig::default();

    let service_down = ScriptedSynth::failing(SynthesisError::Service("HTTP 503".to_owned()));
    let err = generate_with_opts(
        &request("One. Two.", 2, "hi"),
        &service_down,
        &cfg,
        &opts_in(root.path()),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PressPlayError::Synthesis(SynthesisError::Service(_))
    ));
    assert_eq!(service_down.calls(), 1);
    assert_eq!(leftovers(root.path()), 0);

    let empty_audio = ScriptedSynth::ok(Vec::new(), Some(2.0));
    let err = generate_with_opts(
        &request("One. Two.", 2, "hi"),
        &empty_audio,
        &cfg,
        &opts_in(root.path()),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PressPlayError::Synthesis(SynthesisError::InvalidAudio(_))
    ));
    assert_eq!(leftovers(root.path()), 0);
}

#[test]
fn cancelled_run_stops_and_leaves_nothing_behind() {
    let root = tempfile::tempdir().unwrap();
    let synth = ScriptedSynth::ok(vec![0u8; 64], Some(3.0));
    let opts = GenerateOpts {
        cancel: Some(Arc::new(AtomicBool::new(true))),
        workspace_root: Some(root.path().to_path_buf()),
    };
    let err = generate_with_opts(
        &request("One. Two.", 1, "en"),
        &synth,
        &PipelineConfig::default(),
        &opts,
    )
    .unwrap_err();
    if is_ffmpeg_on_path() && crate::assets::media::is_ffprobe_on_path() {
        assert!(matches!(err, PressPlayError::Cancelled), "{err}");
    } else {
        assert!(matches!(err, PressPlayError::RenderDependency(_)), "{err}");
    }
    assert_eq!(leftovers(root.path()), 0);
}

#[test]
fn plan_timeline_reproduces_the_reference_example() {
    let tl = plan_timeline("A. B! C?", 2, 9.0, &PipelineConfig::default()).unwrap();
    let images: Vec<usize> = tl.scenes.iter().map(|s| s.image_index).collect();
    assert_eq!(images, vec![0, 1, 0]);
    assert!(tl.scenes.iter().all(|s| (s.duration_secs - 3.0).abs() < 1e-9));
    assert!((tl.nominal_video_secs() - 8.0).abs() < 1e-9);
    assert!((tl.output_secs() - 9.0).abs() < 1e-9);

    assert!(matches!(
        plan_timeline("", 2, 9.0, &PipelineConfig::default()),
        Err(PressPlayError::Validation(ValidationError::EmptyScript))
    ));
    assert!(matches!(
        plan_timeline("A.", 0, 9.0, &PipelineConfig::default()),
        Err(PressPlayError::Validation(ValidationError::NoImages))
    ));
}

#[test]
fn preview_rejects_out_of_range_scenes() {
    let err = render_preview_frame(
        "Only one.",
        vec![ImageSource::from(png_bytes())],
        &PipelineConfig::default(),
        3,
        0.0,
        3.0,
    )
    .unwrap_err();
    assert!(err.is_validation(), "{err}");
}

#[test]
fn undecodable_images_name_their_source() {
    let cfg = PipelineConfig::default();
    let pool = ImagePool::new(vec![ImageSource::from(b"not an image".to_vec())]).unwrap();
    let err = prepare_images(&pool, 1, &cfg).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("image 0"), "{msg}");
    assert!(msg.contains("bytes"), "{msg}");
}

#[test]
fn only_images_used_by_scenes_are_prepared() {
    let cfg = PipelineConfig {
        canvas: crate::foundation::core::Canvas {
            width: 64,
            height: 36,
        },
        ..PipelineConfig::default()
    };
    let pool = ImagePool::new(vec![
        ImageSource::from(png_bytes()),
        ImageSource::from(b"never decoded".to_vec()),
    ])
    .unwrap();
    let prepared = prepare_images(&pool, 1, &cfg).unwrap();
    assert_eq!(prepared.len(), 1);
    assert_eq!((prepared[0].width, prepared[0].height), (64, 36));
}

#[test]
fn rendered_video_writes_its_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let video = RenderedVideo {
        bytes: vec![0, 0, 0, 24, b'f', b't', b'y', b'p'],
        suggested_filename: SUGGESTED_FILENAME.to_owned(),
        metadata: VideoMetadata {
            container: "mp4".to_owned(),
            video_codec: "h264".to_owned(),
            audio_codec: "aac".to_owned(),
            fps: 24.0,
            width: 1280,
            height: 720,
            duration_secs: 1.0,
            audio_secs: 1.0,
            scene_count: 1,
            frame_count: 24,
            crossfade_secs: 0.5,
            audio_sync: AudioSync::FreezeLastFrame,
            language: "en".to_owned(),
        },
    };
    let out = dir.path().join("nested").join(&video.suggested_filename);
    video.write_to(&out).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), video.bytes);

    let json = serde_json::to_value(&video.metadata).unwrap();
    assert_eq!(json["video_codec"], "h264");
    assert_eq!(json["audio_sync"], "freeze_last_frame");
}
