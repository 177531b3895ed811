use super::*;

fn speech(bytes: &[u8], ext: &str, duration: Option<f64>) -> SynthesizedSpeech {
    SynthesizedSpeech {
        bytes: bytes.to_vec(),
        extension: ext.to_owned(),
        duration_secs: duration,
    }
}

#[test]
fn validate_accepts_well_formed_audio() {
    speech(b"ID3", "mp3", None).validate().unwrap();
    speech(b"RIFF", "wav", Some(2.5)).validate().unwrap();
}

#[test]
fn validate_rejects_empty_or_odd_audio() {
    let cases = [
        speech(b"", "mp3", None),
        speech(b"x", "", None),
        speech(b"x", "../mp3", None),
        speech(b"x", "mp3", Some(0.0)),
        speech(b"x", "mp3", Some(f64::NAN)),
    ];
    for c in cases {
        assert!(matches!(c.validate(), Err(SynthesisError::InvalidAudio(_))), "{c:?}");
    }
}
