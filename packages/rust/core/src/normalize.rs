//! Symptom string normalization.
//!
//! Underscores become spaces, whitespace runs collapse to one space, and the
//! ends are trimmed. The transform is pure, total, and idempotent.
//!
//! "Whitespace" is Unicode White_Space plus the information separators
//! U+001C..=U+001F, which the stored data treats as spacing too.

use std::sync::LazyLock;

use regex::Regex;

/// Normalize one raw symptom string.
///
/// ```
/// use symptomfix_core::normalize::normalize;
/// assert_eq!(normalize("chest_pain   severe"), "chest pain severe");
/// ```
pub fn normalize(raw: &str) -> String {
    static WS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[\s\x1C-\x1F]+").expect("valid regex"));

    let spaced = raw.replace('_', " ");
    WS_RE.replace_all(&spaced, " ").trim_matches(is_space).to_string()
}

fn is_space(c: char) -> bool {
    c.is_whitespace() || ('\u{1C}'..='\u{1F}').contains(&c)
}

/// Normalize a symptom list, keeping order and duplicates.
pub fn normalize_all(symptoms: &[String]) -> Vec<String> {
    symptoms.iter().map(|s| normalize(s)).collect()
}
