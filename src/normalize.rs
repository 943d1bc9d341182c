//! Text canonicalisation shared by scoring, filtering and query building.

use once_cell::sync::Lazy;
use regex::Regex;

/// Tokens dropped before similarity scoring.
pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// Separators between individual artists in a credit string.
/// `+` is not a separator: it appears in duo names like "Sultan + Shepard".
static ARTIST_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r",|&").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Lowercase, collapse whitespace and drop [`STOP_WORDS`] as whole tokens.
pub fn normalize(text: &str) -> String {
    normalize_with(text, STOP_WORDS)
}

/// [`normalize`] against a caller-supplied stop-word table.
pub fn normalize_with(text: &str, stop_words: &[&str]) -> String {
    text.to_lowercase()
        .split_whitespace()
        .filter(|word| !stop_words.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split an artist credit on `,` and `&` into trimmed, non-empty names.
pub fn split_artists(artist: &str) -> Vec<String> {
    ARTIST_SEPARATOR
        .split(artist)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect()
}

/// Lowercased, trimmed title with any parenthetical suffix dropped.
/// `"1973 (Extended Mix)"` -> `"1973"`.
pub fn title_core(title: &str) -> String {
    let lower = title.trim().to_lowercase();
    match lower.find('(') {
        Some(idx) => lower[..idx].trim().to_string(),
        None => lower,
    }
}

/// Fix up titles mangled by copy/paste: collapse whitespace runs and close
/// a trailing unbalanced parenthesis.
pub fn repair_title(title: &str) -> String {
    let mut repaired = title.to_string();
    if let Some(open) = repaired.rfind('(') {
        if !repaired[open..].contains(')') {
            repaired.push(')');
        }
    }
    WHITESPACE.replace_all(&repaired, " ").trim().to_string()
}
