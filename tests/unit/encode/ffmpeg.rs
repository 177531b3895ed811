use super::*;
use crate::assets::media::{is_ffprobe_on_path, probe_duration_secs};
use crate::encode::sink::AudioInputConfig;

fn cfg(width: u32, height: u32, audio: Option<AudioInputConfig>) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps::new(24, 1).unwrap(),
        audio,
    }
}

fn args_of(cmd: &Command) -> Vec<String> {
    cmd.get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn command_muxes_aac_narration_without_trimming() {
    let sink = FfmpegSink::new(FfmpegSinkOpts::new("/tmp/out.mp4"));
    let audio = AudioInputConfig {
        path: PathBuf::from("/tmp/narration.mp3"),
    };
    let args = args_of(&sink.build_command(&cfg(1280, 720, Some(audio))));

    let joined = args.join(" ");
    assert!(joined.contains("-f rawvideo -pix_fmt rgba -s 1280x720 -r 24/1 -i pipe:0"));
    assert!(joined.contains("-i /tmp/narration.mp3"));
    assert!(joined.contains("-c:v libx264 -pix_fmt yuv420p"));
    assert!(joined.contains("-c:a aac"));
    assert!(joined.contains("-movflags +faststart"));
    assert!(!args.iter().any(|a| a == "-shortest"));
    assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp4"));
}

#[test]
fn command_without_audio_disables_audio_stream() {
    let sink = FfmpegSink::new(FfmpegSinkOpts::new("out.mp4"));
    let args = args_of(&sink.build_command(&cfg(64, 64, None)));
    assert!(args.iter().any(|a| a == "-an"));
    assert!(!args.iter().any(|a| a == "aac"));
}

#[test]
fn begin_rejects_odd_sizes_and_missing_audio() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("out.mp4"));
    assert!(sink.begin(cfg(63, 64, None)).unwrap_err().is_validation());

    let dir = tempfile::tempdir().unwrap();
    let missing = AudioInputConfig {
        path: dir.path().join("missing.mp3"),
    };
    assert!(matches!(
        sink.begin(cfg(64, 64, Some(missing))),
        Err(PressPlayError::Render(_))
    ));
}

#[test]
fn push_before_begin_fails() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("out.mp4"));
    let frame = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 16],
        premultiplied: true,
    };
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
}

#[test]
fn encodes_frames_to_mp4() {
    if !is_ffmpeg_on_path() || !is_ffprobe_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("clip.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    sink.begin(cfg(32, 32, None)).unwrap();

    let frame = FrameRGBA {
        width: 32,
        height: 32,
        data: [40u8, 80, 120, 255].repeat(32 * 32),
        premultiplied: true,
    };
    for i in 0..24 {
        sink.push_frame(FrameIndex(i), &frame).unwrap();
    }
    assert!(sink.push_frame(FrameIndex(3), &frame).is_err());
    sink.end().unwrap();

    let secs = probe_duration_secs(&out).unwrap();
    assert!((secs - 1.0).abs() < 0.1, "{secs}");
}
