use super::*;

#[test]
fn parse_duration_accepts_positive_seconds_only() {
    assert_eq!(parse_duration(Some("9.000000")), Some(9.0));
    assert_eq!(parse_duration(Some(" 1.5 ")), Some(1.5));
    assert_eq!(parse_duration(Some("0")), None);
    assert_eq!(parse_duration(Some("N/A")), None);
    assert_eq!(parse_duration(None), None);
}

#[test]
fn probe_duration_of_generated_tone() {
    if !is_ffmpeg_on_path() || !is_ffprobe_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("tone.wav");
    let status = Command::new("ffmpeg")
        .args([
            "-v",
            "error",
            "-y",
            "-f",
            "lavfi",
            "-i",
            "sine=frequency=440:sample_rate=24000:duration=2",
        ])
        .arg(&wav)
        .status()
        .unwrap();
    assert!(status.success());

    let secs = probe_duration_secs(&wav).unwrap();
    assert!((secs - 2.0).abs() < 0.05, "{secs}");
}
