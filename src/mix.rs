//! Helpers for mix / edit names ("Extended Mix", "DJ X Remix", "Radio Edit").
//!
//! Tracklists and catalogs disagree wildly on how they spell a recording
//! variant, so most fallback strategies boil down to rewriting the title or
//! the mix name with one of these functions and searching again.

use once_cell::sync::Lazy;
use regex::Regex;

/// Length/style qualifiers removed by [`strip_length_qualifiers`], applied in order.
pub const LENGTH_QUALIFIERS: &[&str] = &[
    "extended",
    "edit",
    "club",
    "club mix",
    "radio",
    "radio edit",
    "dub",
    "vip",
    "version",
];

/// Longest remixer credit (in words) accepted by [`primary_remixer`].
pub const MAX_REMIXER_TOKENS: usize = 4;

/// "Extended" qualifiers found inside titles, most specific first.
static EXTENDED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\s*\(extended\s+mix\)").unwrap(),
        Regex::new(r"(?i)\s*\(extended\)").unwrap(),
        Regex::new(r"(?i)\s*\(extended\s+edit\)").unwrap(),
        Regex::new(r"(?i)\s*\(extended\s+version\)").unwrap(),
        Regex::new(r"(?i)\s*\(extended\s+rework\)").unwrap(),
        Regex::new(r"(?i)\s*\bextended\s+mix\b").unwrap(),
        Regex::new(r"(?i)\s*\bextended\b").unwrap(),
    ]
});

static QUALIFIER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    LENGTH_QUALIFIERS
        .iter()
        .map(|q| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(q))).unwrap())
        .collect()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static OPEN_PAREN_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\(\[])\s+").unwrap());
static DANGLING_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[\(\[]\s*$").unwrap());
static EMPTY_PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*(\(\s*\)|\[\s*\])").unwrap());

/// Remove "Extended" qualifiers from a title to recover the base track name.
///
/// `"I'm Gone (Extended Mix)"` -> `"I'm Gone"`, `"The Shiver (Extended)"` ->
/// `"The Shiver"`, `"Opus Extended Mix"` -> `"Opus"`.
pub fn strip_extended_from_title(title: &str) -> String {
    let mut result = title.to_string();
    for pattern in EXTENDED_PATTERNS.iter() {
        result = pattern.replace_all(&result, "").into_owned();
    }
    tidy(&result)
}

/// Remove length/style qualifiers from a mix name. Qualifiers only match as
/// whole words, so remixer names and the word "Remix" survive.
///
/// `"DJ Tennis Extended Remix"` -> `"DJ Tennis Remix"`, `"Extended Mix"` -> `"Mix"`.
pub fn strip_length_qualifiers(mix_name: &str) -> String {
    let mut out = mix_name.to_string();
    for pattern in QUALIFIER_PATTERNS.iter() {
        out = pattern.replace_all(&out, "").into_owned();
    }
    tidy(&out)
}

/// Best-effort remixer name from a mix label: the text before the literal
/// word "Remix", if short enough to plausibly be a name.
///
/// `"DJ Tennis Remix"` -> `Some("DJ Tennis")`.
pub fn primary_remixer(mix_name: &str) -> Option<String> {
    let idx = mix_name.find("Remix")?;
    let name = mix_name[..idx].trim();
    if name.is_empty() || name.split_whitespace().count() > MAX_REMIXER_TOKENS {
        return None;
    }
    Some(name.to_string())
}

/// True when the title already carries the mix name as a parenthetical,
/// e.g. title `"Opus (Extended Mix)"` with mix `"Extended Mix"`.
pub fn mix_in_title(title: &str, mix_name: &str) -> bool {
    title.contains(&format!("({})", mix_name)) || title.contains(&format!("({}", mix_name))
}

/// Title used when scoring an extended mix: everything before the first
/// parenthesis when the title mentions "Extended", otherwise unchanged.
pub fn base_title_for_scoring(title: &str) -> String {
    if title.contains('(') && title.contains("Extended") {
        title.split('(').next().unwrap_or(title).trim().to_string()
    } else {
        title.to_string()
    }
}

fn tidy(s: &str) -> String {
    let s = WHITESPACE.replace_all(s, " ");
    let s = OPEN_PAREN_SPACE.replace_all(&s, "$1");
    let s = EMPTY_PARENS.replace_all(&s, "");
    DANGLING_OPEN.replace_all(s.trim(), "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_extended_variants() {
        assert_eq!(strip_extended_from_title("I'm Gone (Extended Mix)"), "I'm Gone");
        assert_eq!(strip_extended_from_title("The Shiver (Extended)"), "The Shiver");
        assert_eq!(strip_extended_from_title("Song (extended edit)"), "Song");
        assert_eq!(strip_extended_from_title("Song (Extended Version)"), "Song");
        assert_eq!(strip_extended_from_title("Song (Extended Rework)"), "Song");
        assert_eq!(strip_extended_from_title("Opus Extended Mix"), "Opus");
        assert_eq!(strip_extended_from_title("Opus Extended"), "Opus");
    }

    #[test]
    fn test_strip_extended_keeps_other_text() {
        assert_eq!(strip_extended_from_title("Opus"), "Opus");
        assert_eq!(
            strip_extended_from_title("Song (DJ X Extended Remix)"),
            "Song (DJ X Remix)"
        );
        assert_eq!(strip_extended_from_title("Song (Extended"), "Song");
    }

    #[test]
    fn test_strip_length_qualifiers() {
        assert_eq!(strip_length_qualifiers("DJ Tennis Extended Remix"), "DJ Tennis Remix");
        assert_eq!(strip_length_qualifiers("Extended Mix"), "Mix");
        assert_eq!(strip_length_qualifiers("RADIO EDIT"), "");
        assert_eq!(strip_length_qualifiers("Club Mix"), "Mix");
        assert_eq!(strip_length_qualifiers("Artist VIP"), "Artist");
        assert_eq!(strip_length_qualifiers("Dubfire Remix"), "Dubfire Remix");
        assert_eq!(strip_length_qualifiers("Original Mix"), "Original Mix");
    }

    #[test]
    fn test_strip_length_qualifiers_keeps_remix() {
        assert_eq!(strip_length_qualifiers("Extended Remix"), "Remix");
        assert_eq!(strip_length_qualifiers("Radio Remix Edit"), "Remix");
    }

    #[test]
    fn test_primary_remixer() {
        assert_eq!(primary_remixer("DJ Tennis Remix"), Some("DJ Tennis".to_string()));
        assert_eq!(primary_remixer("Remix"), None);
        assert_eq!(primary_remixer("Mix"), None);
        assert_eq!(primary_remixer("One Two Three Four Five Remix"), None);
        assert_eq!(primary_remixer("A B C D Remix"), Some("A B C D".to_string()));
    }

    #[test]
    fn test_mix_in_title() {
        assert!(mix_in_title("Opus (Extended Mix)", "Extended Mix"));
        assert!(mix_in_title("Opus (Extended Mix", "Extended Mix"));
        assert!(!mix_in_title("Opus", "Extended Mix"));
        assert!(!mix_in_title("Opus Extended Mix", "Extended Mix"));
    }

    #[test]
    fn test_base_title_for_scoring() {
        assert_eq!(base_title_for_scoring("Opus (Extended Mix)"), "Opus");
        assert_eq!(base_title_for_scoring("Opus (Radio Edit)"), "Opus (Radio Edit)");
        assert_eq!(base_title_for_scoring("Opus"), "Opus");
    }
}
