pub mod cascade;
pub mod catalog;
pub mod config;
pub mod filter;
pub mod logging;
pub mod matcher;
pub mod mix;
pub mod normalize;
pub mod query;
pub mod rate_limiter;
pub mod scoring;
pub mod spotify;
pub mod sync;
pub mod track;

pub use cascade::{plan, CandidateRetriever, CatalogQuery, Retrieval, RetrieverOptions, Strategy};
pub use catalog::{
    CatalogError, CatalogRecord, CatalogSearch, PlaylistStore, RemotePlaylist, StaticToken, TokenProvider,
};
pub use config::Config;
pub use filter::{filter_by_duration, prefer_exact, DURATION_TOLERANCE_SECS};
pub use logging::init_logging;
pub use matcher::{
    classify, decide, match_confidence, MatchSummary, DEFAULT_MIN_CONFIDENCE, EXACT_THRESHOLD,
};
pub use normalize::normalize;
pub use query::build_queries;
pub use scoring::score;
pub use spotify::SpotifyClient;
pub use sync::{
    default_playlist_name, find_matches, materialize, playlist_description, read_playlist, report,
    InputError, PlaylistOutcome,
};
pub use track::{MatchResult, MatchStatus, Playlist, Track, TrackError};
