/// Convenience result type used across PressPlay.
pub type PressPlayResult<T> = Result<T, PressPlayError>;

/// Top-level error taxonomy for a generation request.
///
/// Every variant aborts the request; callers branch on the variant to decide how to report it
/// (bad input, flaky speech service, broken deployment, or a genuine render failure).
#[derive(thiserror::Error, Debug)]
pub enum PressPlayError {
    /// Caller input failed a precondition. No work was attempted.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The speech collaborator failed or rejected the request.
    #[error("synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// A native capability needed for rendering is missing (font, `ffmpeg`, `ffprobe`).
    #[error("render dependency missing: {0}")]
    RenderDependency(String),

    /// Composition or encoding failed.
    #[error("render error: {0}")]
    Render(String),

    /// The caller abandoned the request.
    #[error("generation cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Input preconditions checked before any resource is acquired.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The script is empty or whitespace only.
    #[error("script text is empty")]
    EmptyScript,

    /// No background image was supplied.
    #[error("at least one background image is required")]
    NoImages,

    /// The script produced no narration units.
    #[error("no sentences found in script text")]
    NoSentences,

    /// Invalid pipeline configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Failures reported by a [`crate::SpeechSynthesizer`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// The requested language code is not in the configured set.
    #[error("unsupported language code '{code}'")]
    UnsupportedLanguage {
        /// Code as supplied by the caller.
        code: String,
    },

    /// The service call failed (network, quota, HTTP status).
    #[error("speech service failed: {0}")]
    Service(String),

    /// The service answered but the audio is unusable.
    #[error("invalid synthesized audio: {0}")]
    InvalidAudio(String),
}

impl PressPlayError {
    /// Build a [`PressPlayError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PressPlayError::RenderDependency`] value.
    pub fn render_dependency(msg: impl Into<String>) -> Self {
        Self::RenderDependency(msg.into())
    }

    /// Build a [`ValidationError::Config`] wrapped in [`PressPlayError::Validation`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Validation(ValidationError::Config(msg.into()))
    }

    /// Return `true` for input errors that a caller can fix by changing the request.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
