//! Search-query generation, most constrained first.
//!
//! Queries use the catalog's field syntax (`artist:"…"`, `album:"…"`,
//! `year:YYYY`, `year:YYYY-YYYY`). Labels have no search field, so they are
//! appended as plain keywords.

use std::collections::HashSet;

use crate::mix::mix_in_title;
use crate::track::{Track, ORIGINAL_MIX};

/// Quoted title, with the mix appended as a parenthetical when the track has
/// a meaningful mix that the title does not already carry.
pub fn quoted_title_with_mix(track: &Track) -> String {
    match track.meaningful_mix() {
        Some(mix) if !mix_in_title(&track.title, mix) => format!("\"{} ({})\"", track.title, mix),
        _ => quoted(&track.title),
    }
}

pub fn quoted(value: &str) -> String {
    format!("\"{}\"", value)
}

/// Strip embedded quotes so free-text fields cannot break a quoted term.
fn sanitize(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.replace('"', "").trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build the ordered, de-duplicated list of search queries for a track.
pub fn build_queries(track: &Track) -> Vec<String> {
    let title_with_mix = quoted_title_with_mix(track);
    let title_plain = quoted(&track.title);
    let album = sanitize(track.album.as_deref());
    let label = sanitize(track.label.as_deref());
    let artist = &track.artist;

    let mut queries = Vec::new();

    if let Some(year) = track.year {
        if track.mix_name.as_deref() != Some(ORIGINAL_MIX) {
            queries.push(format!("{} artist:\"{}\" year:{}", title_with_mix, artist, year));
            queries.push(format!(
                "{} artist:\"{}\" year:{}-{}",
                title_with_mix,
                artist,
                year.saturating_sub(1),
                year.saturating_add(1)
            ));
        }
        queries.push(format!("{} {} year:{}", track.title, artist, year));
    }

    queries.push(format!("{} artist:\"{}\"", title_with_mix, artist));
    queries.push(format!("{} {}", track.title, artist));

    if track.meaningful_mix().is_some() {
        queries.push(title_with_mix.clone());
    }
    queries.push(title_plain.clone());

    for remixer in &track.remixers {
        queries.push(format!("{} {}", title_plain, quoted(remixer)));
    }

    if let Some(album) = &album {
        if let Some(year) = track.year {
            queries.push(format!(
                "{} artist:\"{}\" album:\"{}\" year:{}",
                title_plain, artist, album, year
            ));
        }
        queries.push(format!("{} artist:\"{}\" album:\"{}\"", title_plain, artist, album));
        queries.push(format!("album:\"{}\" {}", album, track.title));
    }

    if let Some(label) = &label {
        queries.push(format!("{} artist:\"{}\" {}", title_plain, artist, label));
    }

    dedup_preserving_order(queries)
}

pub(crate) fn dedup_preserving_order(queries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    queries.into_iter().filter(|q| seen.insert(q.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_track() -> Track {
        Track::new("Opus", "Eric Prydz")
            .with_mix_name(Some("Extended Mix".into()))
            .with_year(2015)
            .with_album("Opus")
            .with_label("Virgin")
            .with_remixers(vec!["Four Tet".into()])
    }

    #[test]
    fn test_minimal_track() {
        let queries = build_queries(&Track::new("Strobe", "deadmau5"));
        assert_eq!(
            queries,
            vec![
                "\"Strobe\" artist:\"deadmau5\"".to_string(),
                "Strobe deadmau5".to_string(),
                "\"Strobe\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_full_track_order() {
        let queries = build_queries(&full_track());
        assert_eq!(
            queries,
            vec![
                "\"Opus (Extended Mix)\" artist:\"Eric Prydz\" year:2015",
                "\"Opus (Extended Mix)\" artist:\"Eric Prydz\" year:2014-2016",
                "Opus Eric Prydz year:2015",
                "\"Opus (Extended Mix)\" artist:\"Eric Prydz\"",
                "Opus Eric Prydz",
                "\"Opus (Extended Mix)\"",
                "\"Opus\"",
                "\"Opus\" \"Four Tet\"",
                "\"Opus\" artist:\"Eric Prydz\" album:\"Opus\" year:2015",
                "\"Opus\" artist:\"Eric Prydz\" album:\"Opus\"",
                "album:\"Opus\" Opus",
                "\"Opus\" artist:\"Eric Prydz\" Virgin",
            ]
        );
    }

    #[test]
    fn test_mix_already_in_title_is_not_doubled() {
        let track = Track::new("Opus (Extended Mix)", "Eric Prydz")
            .with_mix_name(Some("Extended Mix".into()));
        let queries = build_queries(&track);
        assert!(queries.iter().all(|q| !q.contains("(Extended Mix) (Extended Mix)")));
        assert_eq!(queries[0], "\"Opus (Extended Mix)\" artist:\"Eric Prydz\"");
        // title-with-mix equals the plain title, so it appears only once
        assert_eq!(queries.iter().filter(|q| *q == "\"Opus (Extended Mix)\"").count(), 1);
    }

    #[test]
    fn test_original_mix_skips_year_mix_queries() {
        let track = Track::new("Opus", "Eric Prydz")
            .with_mix_name(Some("Original Mix".into()))
            .with_year(2015);
        let queries = build_queries(&track);
        assert_eq!(queries[0], "Opus Eric Prydz year:2015");
        assert!(queries.iter().all(|q| !q.contains("Original Mix")));
    }

    #[test]
    fn test_extreme_years_do_not_overflow() {
        let track = Track::new("A", "B").with_year(i32::MAX);
        let queries = build_queries(&track);
        assert!(queries.contains(&format!("\"A\" artist:\"B\" year:{}-{}", i32::MAX - 1, i32::MAX)));

        let track = Track::new("A", "B").with_year(i32::MIN);
        let queries = build_queries(&track);
        assert!(queries.contains(&format!("\"A\" artist:\"B\" year:{}-{}", i32::MIN, i32::MIN + 1)));
    }

    #[test]
    fn test_album_and_label_are_sanitized() {
        let track = Track::new("A", "B").with_album("The \"Best\" Of").with_label("  ");
        let queries = build_queries(&track);
        assert!(queries.contains(&"album:\"The Best Of\" A".to_string()));
        assert!(queries.iter().all(|q| !q.ends_with(' ')));
    }

    #[test]
    fn test_build_queries_is_deterministic_and_unique() {
        let track = full_track();
        let first = build_queries(&track);
        let second = build_queries(&track);
        assert_eq!(first, second);

        let unique: HashSet<&String> = first.iter().collect();
        assert_eq!(unique.len(), first.len());
    }
}
