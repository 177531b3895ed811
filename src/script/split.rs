use std::sync::LazyLock;

use regex::Regex;

/// One sentence-equivalent span of the script; becomes exactly one scene.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct NarrationUnit {
    /// 0-based position in the script.
    pub index: usize,
    /// Trimmed, non-empty unit text.
    pub text: String,
}

// Either a run of terminal punctuation followed by one whitespace char, or a blank line.
static BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<punct>[.!?]+)\s|(?:\r?\n){2,}").expect("sentence boundary regex is valid")
});

/// Split `text` into trimmed, non-empty sentences in source order.
///
/// Punctuation stays attached to its sentence. Text without any boundary yields one sentence;
/// empty or whitespace-only text yields none.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = 0usize;

    for caps in BOUNDARY.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let end = match caps.name("punct") {
            Some(p) => p.end(),
            None => whole.start(),
        };
        push_trimmed(&mut out, &text[cursor..end]);
        cursor = whole.end();
    }
    push_trimmed(&mut out, &text[cursor..]);

    out
}

/// Split `text` and number the resulting units.
pub fn narration_units(text: &str) -> Vec<NarrationUnit> {
    split_sentences(text)
        .into_iter()
        .enumerate()
        .map(|(index, text)| NarrationUnit { index, text })
        .collect()
}

/// Text handed to the speech collaborator: every unit joined by a single space.
pub fn narration_text(units: &[NarrationUnit]) -> String {
    units
        .iter()
        .map(|u| u.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_trimmed(out: &mut Vec<String>, span: &str) {
    let s = span.trim();
    if !s.is_empty() {
        out.push(s.to_string());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/split.rs"]
mod tests;
