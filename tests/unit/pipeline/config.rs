use super::*;

#[test]
fn empty_json_yields_the_defaults() {
    let cfg = PipelineConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, PipelineConfig::default());
    assert_eq!(cfg.canvas, Canvas::HD_720);
    assert_eq!(cfg.fps, Fps { num: 24, den: 1 });
    assert_eq!(cfg.crossfade_secs, 0.5);
    assert_eq!(cfg.audio_sync, AudioSync::FreezeLastFrame);
    cfg.validate().unwrap();
}

#[test]
fn partial_json_overrides_only_named_fields() {
    let cfg = PipelineConfig::from_json_str(
        r#"{
            "crossfade_secs": 0.25,
            "audio_sync": "overlap",
            "caption": { "font_size_px": 40 },
            "threading": { "parallel": true, "threads": 4 },
            "extra_languages": { "ne": "Nepali" }
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.crossfade_secs, 0.25);
    assert_eq!(cfg.audio_sync, AudioSync::Overlap);
    assert_eq!(cfg.caption.font_size_px, 40.0);
    assert_eq!(cfg.caption.max_width_px, 1200.0);
    assert!(cfg.threading.parallel);
    assert_eq!(cfg.threading.chunk_size, 64);
    assert!(cfg.languages().resolve("ne").is_ok());
    cfg.validate().unwrap();
}

#[test]
fn malformed_json_is_a_config_error() {
    let err = PipelineConfig::from_json_str("{ nope").unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("invalid configuration"));
}

#[test]
fn validate_rejects_unusable_values() {
    let cases: Vec<Box<dyn Fn(&mut PipelineConfig)>> = vec![
        Box::new(|c| c.canvas.width = 1281),
        Box::new(|c| c.canvas.height = 0),
        Box::new(|c| c.fps.num = 0),
        Box::new(|c| c.crossfade_secs = -0.5),
        Box::new(|c| c.crossfade_secs = f64::NAN),
        Box::new(|c| c.zoom.from = 0.9),
        Box::new(|c| c.caption.anchor_y = 2.0),
        Box::new(|c| c.threading.threads = Some(0)),
        Box::new(|c| c.crf = 60),
        Box::new(|c| c.tts.tld = " ".to_owned()),
    ];
    for (i, mutate) in cases.iter().enumerate() {
        let mut cfg = PipelineConfig::default();
        mutate(&mut cfg);
        assert!(cfg.validate().unwrap_err().is_validation(), "case {i}");
    }
}

#[test]
fn env_overrides_font_and_tld() {
    let mut cfg = PipelineConfig::default();
    cfg.apply_env_from(|key| match key {
        ENV_FONT => Some("/fonts/Bold.ttf".to_owned()),
        ENV_TTS_TLD => Some(" co.in ".to_owned()),
        _ => None,
    });
    assert_eq!(cfg.font_path, Some(PathBuf::from("/fonts/Bold.ttf")));
    assert_eq!(cfg.tts.tld, "co.in");

    let mut untouched = PipelineConfig::default();
    untouched.apply_env_from(|_| Some(String::new()));
    assert_eq!(untouched, PipelineConfig::default());
}

#[test]
fn from_path_reads_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pressplay.json");
    std::fs::write(&path, r#"{ "crf": 18 }"#).unwrap();
    assert_eq!(PipelineConfig::from_path(&path).unwrap().crf, 18);
    assert!(PipelineConfig::from_path(&dir.path().join("missing.json")).is_err());
}
