//! Candidate narrowing: identity preference and duration tolerance.

use crate::normalize::{split_artists, title_core};
use crate::track::Track;

/// Allowed difference between source and candidate duration, in seconds.
pub const DURATION_TOLERANCE_SECS: u32 = 5;

/// Candidates whose title matches the source title exactly (ignoring case
/// and any parenthetical suffix) and whose artist credit mentions at least
/// one of the source's individual artists, in any order.
///
/// Tracklist `"Sultan + Shepard, Colyn - 1973 (Extended Mix)"` accepts
/// catalog `"Colyn, Sultan + Shepard - 1973"`.
pub fn prefer_exact(candidates: &[Track], source: &Track) -> Vec<Track> {
    let wanted_title = title_core(&source.title);
    let wanted_artists: Vec<String> = split_artists(&source.artist)
        .iter()
        .map(|a| a.to_lowercase())
        .collect();

    candidates
        .iter()
        .filter(|c| title_core(&c.title) == wanted_title)
        .filter(|c| {
            let credit = c.artist.to_lowercase();
            wanted_artists.iter().any(|a| credit.contains(a.as_str()))
        })
        .cloned()
        .collect()
}

/// Keep candidates within [`DURATION_TOLERANCE_SECS`] of the source duration.
///
/// A zero duration counts as unknown on either side. Never discards
/// everything: with no source duration, or when nothing is within
/// tolerance, the input comes back unchanged.
pub fn filter_by_duration(candidates: &[Track], source: &Track) -> Vec<Track> {
    filter_by_duration_with(candidates, source, DURATION_TOLERANCE_SECS)
}

pub fn filter_by_duration_with(candidates: &[Track], source: &Track, tolerance: u32) -> Vec<Track> {
    let Some(wanted) = source.duration_seconds.filter(|d| *d > 0) else {
        return candidates.to_vec();
    };

    let min = wanted.saturating_sub(tolerance);
    let max = wanted.saturating_add(tolerance);

    let filtered: Vec<Track> = candidates
        .iter()
        .filter(|c| c.duration_seconds.is_some_and(|d| d > 0 && (min..=max).contains(&d)))
        .cloned()
        .collect();

    if filtered.is_empty() {
        candidates.to_vec()
    } else {
        filtered
    }
}
