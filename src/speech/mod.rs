//! Speech synthesis collaborator and the language registry.

pub(crate) mod google;
pub(crate) mod language;
pub(crate) mod synth;
