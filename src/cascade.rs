//! Candidate retrieval: a cascade of search strategies, tried in order until
//! one of them produces candidates.
//!
//! ```text
//! isrc -> extended fast path -> enhanced queries -> per-artist
//!      -> extended base retry -> trimmed mix -> last resort
//! ```
//!
//! Precise strategies come first; each later one relaxes the query. A
//! failed request never aborts the cascade: it counts as zero candidates
//! and the next query is tried.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, CatalogRecord, CatalogSearch};
use crate::filter::{filter_by_duration, prefer_exact};
use crate::mix::{primary_remixer, strip_extended_from_title, strip_length_qualifiers};
use crate::normalize::{repair_title, split_artists};
use crate::query::{build_queries, dedup_preserving_order, quoted, quoted_title_with_mix};
use crate::track::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Exact recording-code lookup; a hit is taken as ground truth.
    Isrc,
    /// Extended mixes searched under their base title, no duration filter.
    ExtendedFastPath,
    /// Full query list with identity preference and duration filtering.
    Enhanced,
    /// Title against each individual artist of a multi-artist credit.
    PerArtist,
    /// Base title of an extended mix against the full and split credits.
    ExtendedBaseRetry,
    /// Queries rebuilt after dropping length/style qualifiers from the mix.
    TrimmedMix,
    /// Title alone, then title with each artist as a plain keyword.
    LastResort,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Isrc => "isrc",
            Strategy::ExtendedFastPath => "extended-fast-path",
            Strategy::Enhanced => "enhanced",
            Strategy::PerArtist => "per-artist",
            Strategy::ExtendedBaseRetry => "extended-base-retry",
            Strategy::TrimmedMix => "trimmed-mix",
            Strategy::LastResort => "last-resort",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CatalogQuery {
    Isrc(String),
    Text(String),
}

impl fmt::Display for CatalogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogQuery::Isrc(code) => write!(f, "isrc:{}", code),
            CatalogQuery::Text(q) => f.write_str(q),
        }
    }
}

/// One cascade step: the strategy and its queries, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub strategy: Strategy,
    pub queries: Vec<CatalogQuery>,
}

#[derive(Debug, Clone, Copy)]
pub struct RetrieverOptions {
    /// Apply the duration filter in the enhanced-query step.
    pub duration_filter: bool,
}

impl Default for RetrieverOptions {
    fn default() -> Self {
        RetrieverOptions { duration_filter: true }
    }
}

/// What a retrieval produced and how.
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    pub candidates: Vec<Track>,
    /// Strategy and query that produced the candidates, if any did.
    pub hit: Option<(Strategy, CatalogQuery)>,
    pub requests: usize,
    pub failures: usize,
}

/// Runs the cascade against a catalog.
pub struct CandidateRetriever<C> {
    catalog: C,
    options: RetrieverOptions,
}

impl<C: CatalogSearch> CandidateRetriever<C> {
    pub fn new(catalog: C) -> Self {
        Self::with_options(catalog, RetrieverOptions::default())
    }

    pub fn with_options(catalog: C, options: RetrieverOptions) -> Self {
        CandidateRetriever { catalog, options }
    }

    /// Candidates for one source track; empty when every strategy came up dry.
    pub fn retrieve_candidates(&self, track: &Track) -> Vec<Track> {
        self.retrieve(track).candidates
    }

    /// Like [`Self::retrieve_candidates`], also reporting which strategy hit.
    pub fn retrieve(&self, track: &Track) -> Retrieval {
        let track = repaired(track);
        let mut retrieval = Retrieval::default();
        // Queries that already came back empty; repeating them cannot help.
        let mut empty = HashSet::new();

        for step in plan(&track) {
            debug!("{}: strategy {} ({} queries)", track, step.strategy, step.queries.len());

            for (i, query) in step.queries.iter().enumerate() {
                if empty.contains(query) {
                    debug!("  skipping repeated query: {}", query);
                    continue;
                }

                debug!("  [{}] query {}/{}: {}", step.strategy, i + 1, step.queries.len(), query);
                retrieval.requests += 1;

                let records = match self.fetch(query) {
                    Ok(records) => records,
                    Err(e) => {
                        warn!("  [{}] query failed, treating as empty: {}: {}", step.strategy, query, e);
                        retrieval.failures += 1;
                        continue;
                    }
                };

                if records.is_empty() {
                    empty.insert(query.clone());
                    continue;
                }

                let found: Vec<Track> = records.into_iter().map(CatalogRecord::into_track).collect();
                let accepted = self.accept(step.strategy, found, &track);
                if accepted.is_empty() {
                    continue;
                }

                info!(
                    "{}: {} candidate(s) via {} ({})",
                    track,
                    accepted.len(),
                    step.strategy,
                    query
                );
                retrieval.candidates = accepted;
                retrieval.hit = Some((step.strategy, query.clone()));
                return retrieval;
            }
        }

        info!("{}: no candidates after {} request(s)", track, retrieval.requests);
        retrieval
    }

    fn fetch(&self, query: &CatalogQuery) -> Result<Vec<CatalogRecord>, CatalogError> {
        match query {
            CatalogQuery::Isrc(code) => self.catalog.search_by_isrc(code),
            CatalogQuery::Text(q) => self.catalog.search(q),
        }
    }

    fn accept(&self, strategy: Strategy, found: Vec<Track>, track: &Track) -> Vec<Track> {
        if strategy != Strategy::Enhanced {
            return found;
        }

        let preferred = prefer_exact(&found, track);
        if !preferred.is_empty() {
            debug!("  {} exact title/artist match(es)", preferred.len());
            return preferred;
        }

        if self.options.duration_filter && !track.is_extended_mix() {
            filter_by_duration(&found, track)
        } else {
            found
        }
    }
}

fn repaired(track: &Track) -> Track {
    let title = repair_title(&track.title);
    if title == track.title {
        return track.clone();
    }
    info!("repaired title: {:?} -> {:?}", track.title, title);
    track.clone().with_title(title)
}

fn text(queries: Vec<String>) -> Vec<CatalogQuery> {
    dedup_preserving_order(queries).into_iter().map(CatalogQuery::Text).collect()
}

/// Base title of an extended mix, if stripping changes anything.
fn extended_base_title(track: &Track) -> Option<String> {
    if !track.is_extended_mix() {
        return None;
    }
    let base = strip_extended_from_title(&track.title);
    (base != track.title && !base.is_empty()).then_some(base)
}

/// The full cascade for a track: every applicable strategy with its queries.
/// Pure; strategies that do not apply to the track are left out.
pub fn plan(track: &Track) -> Vec<Step> {
    let artists = split_artists(&track.artist);
    let base_title = extended_base_title(track);
    let mut steps = Vec::new();

    if let Some(isrc) = track.isrc.as_deref().map(str::trim).filter(|i| !i.is_empty()) {
        steps.push(Step {
            strategy: Strategy::Isrc,
            queries: vec![CatalogQuery::Isrc(isrc.to_string())],
        });
    }

    if let Some(base) = &base_title {
        let base_track = track.clone().with_title(base.clone()).with_mix_name(None);
        steps.push(Step {
            strategy: Strategy::ExtendedFastPath,
            queries: text(build_queries(&base_track)),
        });
    }

    steps.push(Step {
        strategy: Strategy::Enhanced,
        queries: text(build_queries(track)),
    });

    if !artists.is_empty() {
        let title_plain = quoted(&track.title);
        let title_with_mix = track.meaningful_mix().map(|_| quoted_title_with_mix(track));
        let mut queries = Vec::new();
        for artist in &artists {
            queries.push(format!("{} artist:\"{}\"", title_plain, artist));
            if let Some(with_mix) = &title_with_mix {
                queries.push(format!("{} artist:\"{}\"", with_mix, artist));
            }
        }
        steps.push(Step { strategy: Strategy::PerArtist, queries: text(queries) });
    }

    if let Some(base) = &base_title {
        let base_q = quoted(base);
        let mut queries = vec![
            format!("{} artist:\"{}\"", base_q, track.artist),
            format!("{} {}", base_q, track.artist),
            base_q.clone(),
        ];
        for artist in &artists {
            queries.push(format!("{} artist:\"{}\"", base_q, artist));
            queries.push(format!("{} {}", base_q, quoted(artist)));
        }
        steps.push(Step { strategy: Strategy::ExtendedBaseRetry, queries: text(queries) });
    }

    if let Some(mix) = track.mix_name.as_deref() {
        let trimmed = strip_length_qualifiers(mix);
        if trimmed != mix {
            let trimmed_track = track.clone().with_mix_name(Some(trimmed.clone()));
            let mut queries = build_queries(&trimmed_track);
            if let Some(remixer) = primary_remixer(&trimmed) {
                queries.push(format!("{} {}", quoted(&track.title), quoted(&remixer)));
            }
            steps.push(Step { strategy: Strategy::TrimmedMix, queries: text(queries) });
        }
    }

    let mut last_resort = vec![quoted(&track.title)];
    for artist in &artists {
        last_resort.push(format!("{} {}", quoted(&track.title), artist));
    }
    steps.push(Step { strategy: Strategy::LastResort, queries: text(last_resort) });

    steps
}
