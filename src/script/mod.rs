//! Script handling: turning pasted text into narration units.

/// Sentence splitting.
pub mod split;

pub use split::{NarrationUnit, narration_text, narration_units, split_sentences};
