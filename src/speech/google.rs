//! Google Translate text-to-speech client (the endpoint behind gTTS).
//!
//! The endpoint accepts at most 100 characters per request, so the narration is chunked at word
//! boundaries and the returned MP3 segments are concatenated.

use std::time::Duration;

use anyhow::Context as _;

use crate::{
    foundation::error::{PressPlayResult, SynthesisError},
    speech::{
        language::LanguageCode,
        synth::{SpeechSynthesizer, SynthesizedSpeech},
    },
};

/// Longest text the endpoint accepts in one request.
pub const MAX_CHUNK_CHARS: usize = 100;

/// Connection options for [`GoogleTranslateTts`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GoogleTtsOpts {
    /// Host suffix, e.g. `com` or `co.in`.
    pub tld: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Slower speech.
    pub slow: bool,
}

impl Default for GoogleTtsOpts {
    fn default() -> Self {
        Self {
            tld: "com".to_owned(),
            timeout_secs: 20,
            slow: false,
        }
    }
}

/// [`SpeechSynthesizer`] backed by `translate.google.<tld>/translate_tts`.
#[derive(Clone, Debug)]
pub struct GoogleTranslateTts {
    client: reqwest::blocking::Client,
    opts: GoogleTtsOpts,
}

impl GoogleTranslateTts {
    /// Build a client with `opts`.
    pub fn new(opts: GoogleTtsOpts) -> PressPlayResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("pressplay/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(opts.timeout_secs.max(1)))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self { client, opts })
    }

    fn endpoint(&self) -> String {
        format!("https://translate.google.{}/translate_tts", self.opts.tld)
    }

    fn chunk_request(
        &self,
        chunk: &str,
        language: &LanguageCode,
        idx: usize,
        total: usize,
    ) -> reqwest::blocking::RequestBuilder {
        let speed = if self.opts.slow { "0.3" } else { "1" };
        let total = total.to_string();
        let idx = idx.to_string();
        let textlen = chunk.chars().count().to_string();
        self.client.get(self.endpoint()).query(&[
            ("ie", "UTF-8"),
            ("client", "tw-ob"),
            ("tl", language.as_str()),
            ("q", chunk),
            ("ttsspeed", speed),
            ("total", total.as_str()),
            ("idx", idx.as_str()),
            ("textlen", textlen.as_str()),
        ])
    }
}

impl SpeechSynthesizer for GoogleTranslateTts {
    #[tracing::instrument(level = "debug", skip(self, text), fields(chars = text.chars().count()))]
    fn synthesize(
        &self,
        text: &str,
        language: &LanguageCode,
    ) -> Result<SynthesizedSpeech, SynthesisError> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SynthesisError::Service("nothing to synthesize".to_owned()));
        }

        let mut bytes = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let resp = self
                .chunk_request(chunk, language, idx, chunks.len())
                .send()
                .map_err(|e| SynthesisError::Service(format!("request failed: {e}")))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(SynthesisError::Service(format!(
                    "chunk {}/{} returned HTTP {status}",
                    idx + 1,
                    chunks.len()
                )));
            }
            let body = resp
                .bytes()
                .map_err(|e| SynthesisError::Service(format!("reading audio failed: {e}")))?;
            tracing::trace!(idx, len = body.len(), "tts chunk received");
            bytes.extend_from_slice(&body);
        }

        let speech = SynthesizedSpeech {
            bytes,
            extension: "mp3".to_owned(),
            duration_secs: None,
        };
        speech.validate()?;
        Ok(speech)
    }
}

/// Split `text` into pieces of at most `max_chars` characters, breaking at whitespace.
///
/// Words longer than `max_chars` are split inside the word.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut cur_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let needed = if cur.is_empty() { word_len } else { cur_len + 1 + word_len };
        if needed <= max_chars {
            if !cur.is_empty() {
                cur.push(' ');
            }
            cur.push_str(word);
            cur_len = needed;
            continue;
        }

        if !cur.is_empty() {
            out.push(std::mem::take(&mut cur));
            cur_len = 0;
        }
        if word_len <= max_chars {
            cur.push_str(word);
            cur_len = word_len;
        } else {
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                out.push(piece.iter().collect());
            }
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/speech/google.rs"]
mod tests;
