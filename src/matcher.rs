//! Match decision: pick the best candidate for each source track and classify it.

use tracing::debug;

use crate::mix::base_title_for_scoring;
use crate::scoring::score;
use crate::track::{MatchResult, MatchStatus, Track};

/// Confidence at or above which a match counts as exact.
pub const EXACT_THRESHOLD: f64 = 0.95;

/// Default lower bound for a fuzzy match.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.8;

pub const NO_MATCH_REASON: &str = "No close match found";

/// Classify a confidence value. Exactly one status applies to every value.
pub fn classify(confidence: f64, min_confidence: f64) -> MatchStatus {
    if confidence >= EXACT_THRESHOLD {
        MatchStatus::Exact
    } else if confidence >= min_confidence {
        MatchStatus::Fuzzy
    } else {
        MatchStatus::NoMatch
    }
}

/// The track as it is scored: extended mixes lose their qualifier and mix
/// name so they compare against the canonical catalog entry.
fn scoring_view(track: &Track) -> Track {
    if !track.is_extended_mix() {
        return track.clone();
    }
    track
        .clone()
        .with_title(base_title_for_scoring(&track.title))
        .with_mix_name(None)
}

/// Similarity of a catalog candidate to a source track, as used for the
/// match decision.
pub fn match_confidence(source: &Track, candidate: &Track) -> f64 {
    score(&scoring_view(source), candidate)
}

/// Best candidate by score; ties keep the first one seen.
fn best_candidate<'a>(view: &Track, pool: &'a [Track]) -> Option<(&'a Track, f64)> {
    let mut best: Option<(&Track, f64)> = None;
    let mut best_score = 0.0;
    for candidate in pool {
        let s = score(view, candidate);
        if best.is_none() || s > best_score {
            best = Some((candidate, s));
            best_score = s;
        }
    }
    best
}

/// One result per source track, in input order.
pub fn decide(source_tracks: &[Track], candidate_pool: &[Track], min_confidence: f64) -> Vec<MatchResult> {
    source_tracks
        .iter()
        .map(|source| {
            let view = scoring_view(source);
            match best_candidate(&view, candidate_pool) {
                Some((candidate, confidence)) => match classify(confidence, min_confidence) {
                    MatchStatus::NoMatch => {
                        debug!("{}: best candidate {} only scored {:.3}", source, candidate, confidence);
                        MatchResult::unmatched(source.clone(), confidence, NO_MATCH_REASON)
                    }
                    status => {
                        debug!("{}: {} -> {} ({:.3})", source, status, candidate, confidence);
                        MatchResult::matched(source.clone(), candidate.clone(), confidence, status)
                    }
                },
                None => MatchResult::unmatched(source.clone(), 0.0, NO_MATCH_REASON),
            }
        })
        .collect()
}

/// Classification counts over a batch of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchSummary {
    pub exact: usize,
    pub fuzzy: usize,
    pub unmatched: usize,
}

impl MatchSummary {
    pub fn from_results(results: &[MatchResult]) -> Self {
        let mut summary = MatchSummary::default();
        for result in results {
            match result.status {
                MatchStatus::Exact => summary.exact += 1,
                MatchStatus::Fuzzy => summary.fuzzy += 1,
                MatchStatus::NoMatch => summary.unmatched += 1,
            }
        }
        summary
    }

    pub fn matched(&self) -> usize {
        self.exact + self.fuzzy
    }

    pub fn total(&self) -> usize {
        self.matched() + self.unmatched
    }
}
