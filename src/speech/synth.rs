use crate::{foundation::error::SynthesisError, speech::language::LanguageCode};

/// Narration audio produced for one request.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthesizedSpeech {
    /// Encoded audio bytes.
    pub bytes: Vec<u8>,
    /// Container extension without the dot (`mp3`, `wav`, ...).
    pub extension: String,
    /// Length in seconds when the service reports it; otherwise measured with `ffprobe`.
    pub duration_secs: Option<f64>,
}

impl SynthesizedSpeech {
    /// Reject audio the pipeline cannot use.
    pub fn validate(&self) -> Result<(), SynthesisError> {
        if self.bytes.is_empty() {
            return Err(SynthesisError::InvalidAudio(
                "speech service returned no audio".to_owned(),
            ));
        }
        if self.extension.is_empty()
            || !self.extension.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(SynthesisError::InvalidAudio(format!(
                "unusable audio extension '{}'",
                self.extension
            )));
        }
        if let Some(d) = self.duration_secs
            && !(d.is_finite() && d > 0.0)
        {
            return Err(SynthesisError::InvalidAudio(format!(
                "reported duration {d} is not a positive number of seconds"
            )));
        }
        Ok(())
    }
}

/// Text-to-speech collaborator: the whole narration in, one audio track out.
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` in `language`.
    fn synthesize(
        &self,
        text: &str,
        language: &LanguageCode,
    ) -> Result<SynthesizedSpeech, SynthesisError>;
}

#[cfg(test)]
#[path = "../../tests/unit/speech/synth.rs"]
mod tests;
