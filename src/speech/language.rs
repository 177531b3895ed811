use std::collections::BTreeMap;

use crate::foundation::error::SynthesisError;

/// Narration languages offered out of the box: English plus eleven Indian languages.
pub const BUILTIN_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("hi", "Hindi"),
    ("bn", "Bengali"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("kn", "Kannada"),
    ("gu", "Gujarati"),
    ("mr", "Marathi"),
    ("ml", "Malayalam"),
    ("pa", "Punjabi"),
    ("ur", "Urdu"),
    ("or", "Odia"),
];

/// A validated language code such as `hi` or `en`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Code as sent to the speech service.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Languages a run may request, keyed by code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LanguageSet {
    names: BTreeMap<String, String>,
}

impl Default for LanguageSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LanguageSet {
    /// The built-in set.
    pub fn builtin() -> Self {
        Self {
            names: BUILTIN_LANGUAGES
                .iter()
                .map(|(code, name)| ((*code).to_owned(), (*name).to_owned()))
                .collect(),
        }
    }

    /// Add `code` (named `name`); existing codes keep their name.
    pub fn with_language(mut self, code: &str, name: &str) -> Self {
        let code = normalize(code);
        if !code.is_empty() {
            self.names.entry(code).or_insert_with(|| name.to_owned());
        }
        self
    }

    /// Resolve a caller-supplied code, case- and whitespace-insensitively.
    pub fn resolve(&self, code: &str) -> Result<LanguageCode, SynthesisError> {
        let normalized = normalize(code);
        if self.names.contains_key(&normalized) {
            Ok(LanguageCode(normalized))
        } else {
            Err(SynthesisError::UnsupportedLanguage {
                code: code.to_owned(),
            })
        }
    }

    /// Display name for `code`.
    pub fn name(&self, code: &LanguageCode) -> Option<&str> {
        self.names.get(code.as_str()).map(String::as_str)
    }

    /// `(code, name)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(c, n)| (c.as_str(), n.as_str()))
    }

    /// Number of languages.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}

#[cfg(test)]
#[path = "../../tests/unit/speech/language.rs"]
mod tests;
