//! Interfaces to the music catalog service.
//!
//! The matching core only talks to the catalog through [`CatalogSearch`];
//! playlist materialisation goes through [`PlaylistStore`]. Both are
//! implemented over HTTP by [`crate::spotify::SpotifyClient`] and by
//! in-memory fakes in tests.

use thiserror::Error;

use crate::track::Track;

/// Source tag given to tracks converted from catalog records.
pub const CATALOG_SOURCE: &str = "catalog";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no access token available")]
    MissingCredential,
    #[error("catalog rejected the access token (status {0})")]
    Unauthorized(u16),
    #[error("catalog rate limit hit")]
    RateLimited,
    #[error("catalog returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed catalog response: {0}")]
    Decode(#[from] std::io::Error),
}

/// A raw search hit, before conversion into a [`Track`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogRecord {
    pub title: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub duration_ms: Option<u64>,
    pub external_id: Option<String>,
    pub release_year: Option<i32>,
    pub isrc: Option<String>,
}

impl CatalogRecord {
    pub fn into_track(self) -> Track {
        Track {
            title: self.title,
            artist: self.artists.join(", "),
            album: self.album,
            duration_seconds: self.duration_ms.and_then(|ms| u32::try_from(ms / 1000).ok()),
            external_id: self.external_id,
            source: CATALOG_SOURCE.to_string(),
            isrc: self.isrc,
            mix_name: None,
            label: None,
            year: self.release_year,
            remixers: Vec::new(),
        }
    }
}

/// Executes search queries against the catalog.
///
/// An empty result is `Ok(vec![])`, never an error.
pub trait CatalogSearch {
    fn search(&self, query: &str) -> Result<Vec<CatalogRecord>, CatalogError>;

    /// Exact lookup by recording code; at most one record is expected.
    fn search_by_isrc(&self, isrc: &str) -> Result<Vec<CatalogRecord>, CatalogError>;
}

impl<C: CatalogSearch + ?Sized> CatalogSearch for &C {
    fn search(&self, query: &str) -> Result<Vec<CatalogRecord>, CatalogError> {
        (**self).search(query)
    }

    fn search_by_isrc(&self, isrc: &str) -> Result<Vec<CatalogRecord>, CatalogError> {
        (**self).search_by_isrc(isrc)
    }
}

/// Supplies the bearer credential for catalog requests. Refresh and expiry
/// are the provider's business.
pub trait TokenProvider {
    fn access_token(&self) -> Result<String, CatalogError>;
}

/// A fixed token, e.g. taken from the environment.
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn access_token(&self) -> Result<String, CatalogError> {
        if self.0.trim().is_empty() {
            return Err(CatalogError::MissingCredential);
        }
        Ok(self.0.clone())
    }
}

/// A playlist owned by the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePlaylist {
    pub id: String,
    pub name: String,
}

/// Playlist mutations needed to materialise a match run.
pub trait PlaylistStore {
    fn find_playlist_by_name(&self, name: &str) -> Result<Option<RemotePlaylist>, CatalogError>;

    fn create_playlist(
        &self,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<RemotePlaylist, CatalogError>;

    /// Remove every track from the playlist, returning how many were removed.
    fn clear_playlist(&self, playlist_id: &str) -> Result<usize, CatalogError>;

    /// Append tracks by catalog id, preserving order.
    fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), CatalogError>;
}
