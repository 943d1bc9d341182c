//! Tracklist-to-playlist run: gather candidates, decide matches, report,
//! and write the matched tracks to a playlist.

use std::collections::HashSet;
use std::io::Read;

use thiserror::Error;
use tracing::{info, warn};

use crate::cascade::CandidateRetriever;
use crate::catalog::{CatalogError, CatalogSearch, PlaylistStore, RemotePlaylist};
use crate::matcher::{decide, MatchSummary};
use crate::track::{MatchResult, MatchStatus, Playlist, Track, TrackError};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("could not read playlist: {0}")]
    Json(#[from] serde_json::Error),
    #[error("playlist {0:?} has no tracks")]
    Empty(String),
    #[error("track {position}: {source}")]
    InvalidTrack { position: usize, source: TrackError },
}

/// Read a JSON playlist and validate every track.
pub fn read_playlist(reader: impl Read) -> Result<Playlist, InputError> {
    let playlist: Playlist = serde_json::from_reader(reader)?;
    if playlist.tracks.is_empty() {
        return Err(InputError::Empty(playlist.name));
    }
    playlist
        .validate()
        .map_err(|(position, source)| InputError::InvalidTrack { position, source })?;
    Ok(playlist)
}

pub fn default_playlist_name(source_name: &str) -> String {
    format!("Tracklist Sync: {}", source_name)
}

pub fn playlist_description(source_name: &str) -> String {
    format!("Synced tracklist: {}", source_name)
}

/// Run the cascade for every track and add the results to `pool`.
/// Candidates already in the pool (same catalog id) are not added twice.
pub fn gather_candidates<C: CatalogSearch>(
    retriever: &CandidateRetriever<C>,
    tracks: &[Track],
    pool: &mut Vec<Track>,
) {
    let mut seen: HashSet<String> = pool.iter().filter_map(|t| t.external_id.clone()).collect();

    for (i, track) in tracks.iter().enumerate() {
        info!("[{}/{}] searching: {}", i + 1, tracks.len(), track);
        for candidate in retriever.retrieve_candidates(track) {
            let fresh = match &candidate.external_id {
                Some(id) => seen.insert(id.clone()),
                None => true,
            };
            if fresh {
                pool.push(candidate);
            }
        }
    }
}

/// Retrieve candidates for every source track, union them into
/// `candidate_pool`, and decide one match per source track.
pub fn find_matches<C: CatalogSearch>(
    retriever: &CandidateRetriever<C>,
    source_tracks: &[Track],
    candidate_pool: Vec<Track>,
    min_confidence: f64,
) -> Vec<MatchResult> {
    let mut pool = candidate_pool;
    gather_candidates(retriever, source_tracks, &mut pool);
    info!("{} candidate(s) in pool for {} track(s)", pool.len(), source_tracks.len());
    decide(source_tracks, &pool, min_confidence)
}

/// Log the classification counts and list the tracks that need manual work.
pub fn report(results: &[MatchResult]) -> MatchSummary {
    let summary = MatchSummary::from_results(results);

    for result in results {
        info!("{}", result);
    }
    info!(
        "exact: {}, fuzzy: {}, unmatched: {} (of {})",
        summary.exact,
        summary.fuzzy,
        summary.unmatched,
        summary.total()
    );

    if summary.unmatched > 0 {
        warn!("{} track(s) could not be matched:", summary.unmatched);
        for result in results.iter().filter(|r| !r.is_match()) {
            warn!("  {}", result.source_track);
        }
    }
    summary
}

/// Catalog ids to write: exact matches first, then fuzzy, in tracklist order.
pub fn playlist_track_ids(results: &[MatchResult]) -> Vec<String> {
    [MatchStatus::Exact, MatchStatus::Fuzzy]
        .iter()
        .flat_map(|status| {
            results
                .iter()
                .filter(move |r| r.status == *status)
                .filter_map(|r| r.candidate_track.as_ref()?.external_id.clone())
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistOutcome {
    pub playlist: RemotePlaylist,
    pub reused: bool,
    /// Tracks removed from a reused playlist.
    pub cleared: usize,
    pub added: usize,
}

/// Write matched tracks to the playlist called `name`, replacing the
/// contents of an existing one. Nothing is touched when no track matched.
pub fn materialize<S: PlaylistStore>(
    store: &S,
    name: &str,
    description: &str,
    public: bool,
    results: &[MatchResult],
) -> Result<Option<PlaylistOutcome>, CatalogError> {
    let ids = playlist_track_ids(results);
    if ids.is_empty() {
        warn!("no matched tracks; playlist {:?} left untouched", name);
        return Ok(None);
    }

    let (playlist, reused, cleared) = match store.find_playlist_by_name(name)? {
        Some(existing) => {
            let cleared = store.clear_playlist(&existing.id)?;
            info!("reusing playlist {:?} ({}), removed {} track(s)", name, existing.id, cleared);
            (existing, true, cleared)
        }
        None => {
            let created = store.create_playlist(name, description, public)?;
            info!("created playlist {:?} ({})", name, created.id);
            (created, false, 0)
        }
    };

    store.add_tracks(&playlist.id, &ids)?;
    info!("added {} track(s) to {:?}", ids.len(), name);

    Ok(Some(PlaylistOutcome { playlist, reused, cleared, added: ids.len() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fakes::{record, MemoryPlaylists, ScriptedCatalog};
    use crate::matcher::{DEFAULT_MIN_CONFIDENCE, NO_MATCH_REASON};

    fn catalog_track(title: &str, artist: &str, id: &str) -> Track {
        Track::new(title, artist).with_external_id(id).with_source("catalog")
    }

    #[test]
    fn test_find_matches_with_one_missing_track() {
        let catalog = ScriptedCatalog::new()
            .respond("\"Strobe\" artist:\"deadmau5\"", vec![record("Strobe", &["deadmau5"], 634, "strobe")])
            .respond("\"Opus\" artist:\"Eric Prydz\"", vec![record("Opus", &["Eric Prydz"], 543, "opus")]);
        let retriever = CandidateRetriever::new(&catalog);
        let sources = vec![
            Track::new("Strobe", "deadmau5"),
            Track::new("Unreleased ID", "Unknown Qqq"),
            Track::new("Opus", "Eric Prydz"),
        ];

        let results = find_matches(&retriever, &sources, Vec::new(), DEFAULT_MIN_CONFIDENCE);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].status, MatchStatus::Exact);
        assert_eq!(results[1].status, MatchStatus::NoMatch);
        assert_eq!(results[1].reason, NO_MATCH_REASON);
        assert_eq!(results[2].status, MatchStatus::Exact);
        assert_eq!(results.iter().filter(|r| !r.is_match()).count(), 1);
    }

    #[test]
    fn test_find_matches_uses_initial_pool() {
        let catalog = ScriptedCatalog::new();
        let retriever = CandidateRetriever::new(&catalog);
        let pool = vec![catalog_track("Strobe", "deadmau5", "known")];

        let results = find_matches(&retriever, &[Track::new("Strobe", "deadmau5")], pool, 0.8);
        assert_eq!(results[0].status, MatchStatus::Exact);
        let candidate = results[0].candidate_track.as_ref().unwrap();
        assert_eq!(candidate.external_id.as_deref(), Some("known"));
    }

    #[test]
    fn test_gather_skips_known_ids() {
        let catalog = ScriptedCatalog::new()
            .respond("\"Strobe\" artist:\"deadmau5\"", vec![record("Strobe", &["deadmau5"], 634, "strobe")]);
        let retriever = CandidateRetriever::new(&catalog);
        let mut pool = vec![catalog_track("Strobe", "deadmau5", "strobe")];

        let tracks = vec![Track::new("Strobe", "deadmau5"), Track::new("Strobe", "deadmau5")];
        gather_candidates(&retriever, &tracks, &mut pool);
        assert_eq!(pool.len(), 1);
    }

    fn results_fixture() -> Vec<MatchResult> {
        vec![
            MatchResult::matched(Track::new("A", "X"), catalog_track("A", "X", "fuzzy-1"), 0.85, MatchStatus::Fuzzy),
            MatchResult::matched(Track::new("B", "X"), catalog_track("B", "X", "exact-1"), 1.0, MatchStatus::Exact),
            MatchResult::unmatched(Track::new("C", "X"), 0.2, NO_MATCH_REASON),
            MatchResult::matched(Track::new("D", "X"), Track::new("D", "X"), 0.99, MatchStatus::Exact),
            MatchResult::matched(Track::new("E", "X"), catalog_track("E", "X", "exact-2"), 0.97, MatchStatus::Exact),
        ]
    }

    #[test]
    fn test_exact_ids_come_before_fuzzy() {
        assert_eq!(playlist_track_ids(&results_fixture()), vec!["exact-1", "exact-2", "fuzzy-1"]);
    }

    #[test]
    fn test_materialize_creates_private_playlist() {
        let store = MemoryPlaylists::default();
        let outcome = materialize(
            &store,
            &default_playlist_name("Boiler Room"),
            &playlist_description("Boiler Room"),
            false,
            &results_fixture(),
        )
        .unwrap()
        .unwrap();

        assert!(!outcome.reused);
        assert_eq!(outcome.added, 3);
        assert_eq!(outcome.playlist.name, "Tracklist Sync: Boiler Room");
        assert_eq!(
            store.created.borrow()[0],
            ("Tracklist Sync: Boiler Room".to_string(), "Synced tracklist: Boiler Room".to_string(), false)
        );
        assert_eq!(store.tracks_of(&outcome.playlist.id), vec!["exact-1", "exact-2", "fuzzy-1"]);
    }

    #[test]
    fn test_materialize_reuses_and_clears_existing() {
        let store = MemoryPlaylists::with_existing("My Set", "existing", &["old-1", "old-2"]);
        let outcome = materialize(&store, "My Set", "", false, &results_fixture()).unwrap().unwrap();

        assert!(outcome.reused);
        assert_eq!(outcome.cleared, 2);
        assert_eq!(outcome.playlist.id, "existing");
        assert!(store.created.borrow().is_empty());
        assert_eq!(store.cleared.borrow().as_slice(), ["existing".to_string()]);
        assert_eq!(store.tracks_of("existing"), vec!["exact-1", "exact-2", "fuzzy-1"]);
    }

    #[test]
    fn test_materialize_without_matches_is_noop() {
        let store = MemoryPlaylists::with_existing("My Set", "existing", &["old"]);
        let results = vec![MatchResult::unmatched(Track::new("C", "X"), 0.1, NO_MATCH_REASON)];

        assert_eq!(materialize(&store, "My Set", "", false, &results).unwrap(), None);
        assert!(store.cleared.borrow().is_empty());
        assert_eq!(store.tracks_of("existing"), vec!["old"]);
    }

    #[test]
    fn test_read_playlist() {
        let json = r#"{
            "name": "Boiler Room",
            "source": "tracklist",
            "tracks": [
                {"title": "Strobe", "artist": "deadmau5", "source": "tracklist"},
                {"title": "Opus (Extended Mix)", "artist": "Eric Prydz", "mix_name": "Extended Mix",
                 "duration_seconds": 480, "remixers": []}
            ]
        }"#;
        let playlist = read_playlist(json.as_bytes()).unwrap();
        assert_eq!(playlist.name, "Boiler Room");
        assert_eq!(playlist.tracks.len(), 2);
        assert_eq!(playlist.tracks[1].duration_seconds, Some(480));
    }

    #[test]
    fn test_read_playlist_rejects_bad_input() {
        let invalid = r#"{"name": "Set", "tracks": [{"title": "A", "artist": "B"}, {"title": "", "artist": "C"}]}"#;
        match read_playlist(invalid.as_bytes()) {
            Err(InputError::InvalidTrack { position, .. }) => assert_eq!(position, 2),
            other => panic!("unexpected: {:?}", other),
        }

        let empty = r#"{"name": "Set", "tracks": []}"#;
        assert!(matches!(read_playlist(empty.as_bytes()), Err(InputError::Empty(_))));
        assert!(matches!(read_playlist("not json".as_bytes()), Err(InputError::Json(_))));
    }
}
