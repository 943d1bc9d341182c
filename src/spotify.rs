//! Spotify Web API client: track search and playlist management.

use serde::Deserialize;
use serde_json::json;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, warn};

use crate::catalog::{
    CatalogError, CatalogRecord, CatalogSearch, PlaylistStore, RemotePlaylist, TokenProvider,
};
use crate::rate_limiter::RateLimiter;

pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
const USER_AGENT: &str = concat!("tracksync/", env!("CARGO_PKG_VERSION"));

/// Results requested per text search.
pub const SEARCH_LIMIT: u32 = 50;
/// Playlist track additions and removals are sent in chunks of this size.
pub const PLAYLIST_BATCH: usize = 100;
const PAGE_SIZE: u32 = 50;
const MAX_THROTTLE_RETRIES: u32 = 2;

// ── Response types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Page<Option<ApiTrack>>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<ApiArtist>,
    album: Option<ApiAlbum>,
    duration_ms: Option<u64>,
    #[serde(default)]
    external_ids: ExternalIds,
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiAlbum {
    name: String,
    #[serde(default)]
    release_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalIds {
    isrc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiPlaylist {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    track: Option<PlaylistItemTrack>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemTrack {
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl ApiTrack {
    fn into_record(self) -> CatalogRecord {
        let (album, release_year) = match self.album {
            Some(album) => {
                let year = album
                    .release_date
                    .as_deref()
                    .and_then(|d| d.get(..4))
                    .and_then(|y| y.parse().ok());
                (Some(album.name), year)
            }
            None => (None, None),
        };
        CatalogRecord {
            title: self.name,
            artists: self.artists.into_iter().map(|a| a.name).collect(),
            album,
            duration_ms: self.duration_ms,
            external_id: self.id,
            release_year,
            isrc: self.external_ids.isrc,
        }
    }
}

fn records_from(response: SearchResponse) -> Vec<CatalogRecord> {
    response.tracks.items.into_iter().flatten().map(ApiTrack::into_record).collect()
}

/// Catalog track id to playlist URI. Values that already are URIs pass through.
pub fn track_uri(id: &str) -> String {
    if id.starts_with("spotify:") {
        id.to_string()
    } else {
        format!("spotify:track:{}", id)
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

// ── Client ──────────────────────────────────────────────────────────────────

pub struct SpotifyClient {
    agent: ureq::Agent,
    token: Box<dyn TokenProvider>,
    limiter: Mutex<RateLimiter>,
    base_url: String,
    market: Option<String>,
}

impl SpotifyClient {
    pub fn new(token: Box<dyn TokenProvider>) -> Self {
        SpotifyClient {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(20))
                .user_agent(USER_AGENT)
                .build(),
            token,
            limiter: Mutex::new(RateLimiter::from_millis("spotify", 100)),
            base_url: SPOTIFY_API_URL.to_string(),
            market: None,
        }
    }

    /// Minimum time between requests.
    pub fn with_request_interval(mut self, millis: u64) -> Self {
        self.limiter = Mutex::new(RateLimiter::from_millis("spotify", millis));
        self
    }

    /// Restrict searches to tracks playable in this country.
    pub fn with_market(mut self, market: Option<String>) -> Self {
        self.market = market.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn limiter(&self) -> MutexGuard<'_, RateLimiter> {
        self.limiter.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request with auth and pacing. Throttled requests are retried
    /// a couple of times after backing off.
    fn send(&self, request: ureq::Request, body: Option<&serde_json::Value>) -> Result<ureq::Response, CatalogError> {
        let token = self.token.access_token()?;
        let request = request.set("Authorization", &format!("Bearer {}", token));

        let mut attempt = 0;
        loop {
            self.limiter().wait_if_needed();

            let result = match body {
                Some(body) => request.clone().send_json(body.clone()),
                None => request.clone().call(),
            };

            match result {
                Ok(response) => {
                    self.limiter().report_success();
                    return Ok(response);
                }
                Err(ureq::Error::Status(429, response)) => {
                    let retry_after = response
                        .header("Retry-After")
                        .and_then(|v| v.trim().parse::<u64>().ok())
                        .map(Duration::from_secs);
                    self.limiter().report_throttled(retry_after);
                    if attempt >= MAX_THROTTLE_RETRIES {
                        return Err(CatalogError::RateLimited);
                    }
                    attempt += 1;
                    warn!("spotify rate limit hit, retrying ({}/{})", attempt, MAX_THROTTLE_RETRIES);
                }
                Err(ureq::Error::Status(status, response)) => {
                    if status >= 500 {
                        self.limiter().report_failure();
                    }
                    let message = error_message(&response.into_string().unwrap_or_default());
                    return Err(match status {
                        401 | 403 => CatalogError::Unauthorized(status),
                        _ => CatalogError::Status { status, message },
                    });
                }
                Err(ureq::Error::Transport(transport)) => {
                    self.limiter().report_failure();
                    return Err(CatalogError::Transport(transport.to_string()));
                }
            }
        }
    }

    fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<CatalogRecord>, CatalogError> {
        let mut request = self
            .agent
            .get(&self.url("/search"))
            .query("q", query)
            .query("type", "track")
            .query("limit", &limit.to_string());
        if let Some(market) = &self.market {
            request = request.query("market", market);
        }

        let response: SearchResponse = self.send(request, None)?.into_json()?;
        let records = records_from(response);
        debug!("search {:?}: {} result(s)", query, records.len());
        Ok(records)
    }

    fn current_user_id(&self) -> Result<String, CatalogError> {
        let user: ApiUser = self.send(self.agent.get(&self.url("/me")), None)?.into_json()?;
        Ok(user.id)
    }

    fn playlist_track_uris(&self, playlist_id: &str) -> Result<Vec<String>, CatalogError> {
        let mut uris = Vec::new();
        let mut offset = 0usize;
        loop {
            let request = self
                .agent
                .get(&self.url(&format!("/playlists/{}/tracks", playlist_id)))
                .query("fields", "items(track(uri)),next")
                .query("limit", &PLAYLIST_BATCH.to_string())
                .query("offset", &offset.to_string());
            let page: Page<PlaylistItem> = self.send(request, None)?.into_json()?;
            let count = page.items.len();
            uris.extend(page.items.into_iter().filter_map(|i| i.track.and_then(|t| t.uri)));
            if page.next.is_none() || count == 0 {
                return Ok(uris);
            }
            offset += count;
        }
    }
}

impl CatalogSearch for SpotifyClient {
    fn search(&self, query: &str) -> Result<Vec<CatalogRecord>, CatalogError> {
        self.search_tracks(query, SEARCH_LIMIT)
    }

    fn search_by_isrc(&self, isrc: &str) -> Result<Vec<CatalogRecord>, CatalogError> {
        self.search_tracks(&format!("isrc:{}", isrc), 1)
    }
}

impl PlaylistStore for SpotifyClient {
    fn find_playlist_by_name(&self, name: &str) -> Result<Option<RemotePlaylist>, CatalogError> {
        let mut offset = 0u32;
        loop {
            let request = self
                .agent
                .get(&self.url("/me/playlists"))
                .query("limit", &PAGE_SIZE.to_string())
                .query("offset", &offset.to_string());
            let page: Page<ApiPlaylist> = self.send(request, None)?.into_json()?;
            let count = page.items.len() as u32;

            if let Some(found) = page.items.into_iter().find(|p| p.name == name) {
                return Ok(Some(RemotePlaylist { id: found.id, name: found.name }));
            }
            if page.next.is_none() || count == 0 {
                return Ok(None);
            }
            offset += count;
        }
    }

    fn create_playlist(&self, name: &str, description: &str, public: bool) -> Result<RemotePlaylist, CatalogError> {
        let user_id = self.current_user_id()?;
        let body = json!({
            "name": name,
            "description": description,
            "public": public,
        });
        let request = self.agent.post(&self.url(&format!("/users/{}/playlists", user_id)));
        let created: ApiPlaylist = self.send(request, Some(&body))?.into_json()?;
        Ok(RemotePlaylist { id: created.id, name: created.name })
    }

    fn clear_playlist(&self, playlist_id: &str) -> Result<usize, CatalogError> {
        let uris = self.playlist_track_uris(playlist_id)?;
        let path = format!("/playlists/{}/tracks", playlist_id);
        for chunk in uris.chunks(PLAYLIST_BATCH) {
            let body = json!({
                "tracks": chunk.iter().map(|uri| json!({ "uri": uri })).collect::<Vec<_>>(),
            });
            self.send(self.agent.delete(&self.url(&path)), Some(&body))?;
        }
        Ok(uris.len())
    }

    fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), CatalogError> {
        let uris: Vec<String> = track_ids.iter().map(|id| track_uri(id)).collect();
        let path = format!("/playlists/{}/tracks", playlist_id);
        for chunk in uris.chunks(PLAYLIST_BATCH) {
            let body = json!({ "uris": chunk });
            self.send(self.agent.post(&self.url(&path)), Some(&body))?;
            debug!("added {} track(s) to playlist {}", chunk.len(), playlist_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_JSON: &str = r#"{
        "tracks": {
            "items": [
                {
                    "id": "2SaEXIM5lAJtnrzJWiu0pg",
                    "name": "Opus",
                    "artists": [{"name": "Eric Prydz"}],
                    "album": {"name": "Opus", "release_date": "2016-02-05"},
                    "duration_ms": 543453,
                    "external_ids": {"isrc": "GBCEN1500001"}
                },
                {
                    "id": null,
                    "name": "Opus (Four Tet Remix)",
                    "artists": [{"name": "Eric Prydz"}, {"name": "Four Tet"}],
                    "album": {"name": "Opus Remixes", "release_date": "2016"},
                    "duration_ms": 401000
                }
            ],
            "next": null
        }
    }"#;

    #[test]
    fn test_parse_search_response() {
        let response: SearchResponse = serde_json::from_str(SEARCH_JSON).unwrap();
        let records = records_from(response);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].title, "Opus");
        assert_eq!(records[0].artists, vec!["Eric Prydz"]);
        assert_eq!(records[0].album.as_deref(), Some("Opus"));
        assert_eq!(records[0].release_year, Some(2016));
        assert_eq!(records[0].external_id.as_deref(), Some("2SaEXIM5lAJtnrzJWiu0pg"));
        assert_eq!(records[0].isrc.as_deref(), Some("GBCEN1500001"));

        assert_eq!(records[1].external_id, None);
        assert_eq!(records[1].isrc, None);
        assert_eq!(records[1].clone().into_track().artist, "Eric Prydz, Four Tet");
    }

    #[test]
    fn test_empty_search_response() {
        let response: SearchResponse = serde_json::from_str(r#"{"tracks": {"items": []}}"#).unwrap();
        assert!(records_from(response).is_empty());
    }

    #[test]
    fn test_null_search_items_are_skipped() {
        let json = r#"{"tracks": {"items": [
            null,
            {"id": "a", "name": "Strobe", "artists": [{"name": "deadmau5"}], "duration_ms": 634000},
            null
        ], "next": null}}"#;
        let records = records_from(serde_json::from_str(json).unwrap());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Strobe");
    }

    #[test]
    fn test_odd_release_dates() {
        let json = r#"{"tracks": {"items": [
            {"id": "a", "name": "A", "artists": [], "album": {"name": "X", "release_date": "0000"}},
            {"id": "b", "name": "B", "artists": [], "album": {"name": "Y", "release_date": "19"}},
            {"id": "c", "name": "C", "artists": []}
        ]}}"#;
        let records = records_from(serde_json::from_str(json).unwrap());
        assert_eq!(records[0].release_year, Some(0));
        assert_eq!(records[1].release_year, None);
        assert_eq!(records[2].album, None);
        assert_eq!(records[2].duration_ms, None);
    }

    #[test]
    fn test_track_uri() {
        assert_eq!(track_uri("abc"), "spotify:track:abc");
        assert_eq!(track_uri("spotify:track:abc"), "spotify:track:abc");
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"error": {"status": 400, "message": "No search query"}}"#;
        assert_eq!(error_message(body), "No search query");
        assert_eq!(error_message(" gateway timeout \n"), "gateway timeout");
    }

    #[test]
    fn test_playlist_items_skip_missing_tracks() {
        let json = r#"{"items": [
            {"track": {"uri": "spotify:track:1"}},
            {"track": null},
            {"track": {"uri": null}}
        ], "next": null}"#;
        let page: Page<PlaylistItem> = serde_json::from_str(json).unwrap();
        let uris: Vec<String> = page.items.into_iter().filter_map(|i| i.track.and_then(|t| t.uri)).collect();
        assert_eq!(uris, vec!["spotify:track:1"]);
    }

    #[test]
    fn test_missing_token_fails_before_request() {
        use crate::catalog::StaticToken;
        let client = SpotifyClient::new(Box::new(StaticToken(String::new())))
            .with_base_url("http://127.0.0.1:9");
        assert!(matches!(client.search("anything"), Err(CatalogError::MissingCredential)));
    }
}
