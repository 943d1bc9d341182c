//! Track, playlist and match-result value types.
//!
//! A [`Track`] is treated as an immutable value: derived variants (a title
//! with the mix stripped, a trimmed mix name, ...) are built with the
//! consuming `with_*` helpers on a clone, never by mutating a shared value.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Mix name that carries no information for searching.
pub const ORIGINAL_MIX: &str = "Original Mix";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackError {
    #[error("track has an empty title (artist: {artist:?})")]
    EmptyTitle { artist: String },
    #[error("track {title:?} has an empty artist")]
    EmptyArtist { title: String },
}

/// A single musical work reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    /// May hold several names joined by `,` or `&`.
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    /// Catalog-assigned identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Provenance tag, e.g. "tracklist", "catalog", "manual".
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isrc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub remixers: Vec<String>,
}

impl Track {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Track {
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration_seconds: None,
            external_id: None,
            source: String::new(),
            isrc: None,
            mix_name: None,
            label: None,
            year: None,
            remixers: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_isrc(mut self, isrc: impl Into<String>) -> Self {
        self.isrc = Some(isrc.into());
        self
    }

    /// Replace the mix name. `None` (or an empty string) clears it.
    pub fn with_mix_name(mut self, mix_name: Option<String>) -> Self {
        self.mix_name = mix_name.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_remixers(mut self, remixers: Vec<String>) -> Self {
        self.remixers = remixers;
        self
    }

    /// True when the mix name mentions "extended" in any casing.
    pub fn is_extended_mix(&self) -> bool {
        self.mix_name
            .as_deref()
            .is_some_and(|m| m.to_lowercase().contains("extended"))
    }

    /// Mix name worth putting into a query: present and not "Original Mix".
    pub fn meaningful_mix(&self) -> Option<&str> {
        self.mix_name
            .as_deref()
            .filter(|m| !m.trim().is_empty() && *m != ORIGINAL_MIX)
    }

    /// Reject tracks the matching core cannot work with.
    pub fn validate(&self) -> Result<(), TrackError> {
        if self.title.trim().is_empty() {
            return Err(TrackError::EmptyTitle { artist: self.artist.clone() });
        }
        if self.artist.trim().is_empty() {
            return Err(TrackError::EmptyArtist { title: self.title.clone() });
        }
        Ok(())
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// Ordered collection of tracks, as produced by the tracklist parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    pub tracks: Vec<Track>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub description: String,
}

impl Playlist {
    /// Validate every track, reporting the first offender with its 1-based position.
    pub fn validate(&self) -> Result<(), (usize, TrackError)> {
        for (i, track) in self.tracks.iter().enumerate() {
            track.validate().map_err(|e| (i + 1, e))?;
        }
        Ok(())
    }
}

impl fmt::Display for Playlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} tracks)", self.name, self.tracks.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Exact,
    Fuzzy,
    NoMatch,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Exact => "exact",
            MatchStatus::Fuzzy => "fuzzy",
            MatchStatus::NoMatch => "no_match",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one source track against its best candidate.
///
/// `status == NoMatch` exactly when `candidate_track` is `None`; the
/// constructors below are the only way the matcher builds one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub source_track: Track,
    pub candidate_track: Option<Track>,
    pub confidence: f64,
    pub status: MatchStatus,
    /// Only populated for `NoMatch`.
    pub reason: String,
}

impl MatchResult {
    /// A matched result. `status` must be `Exact` or `Fuzzy`.
    pub fn matched(source: Track, candidate: Track, confidence: f64, status: MatchStatus) -> Self {
        debug_assert!(status != MatchStatus::NoMatch);
        MatchResult {
            source_track: source,
            candidate_track: Some(candidate),
            confidence,
            status,
            reason: String::new(),
        }
    }

    pub fn unmatched(source: Track, confidence: f64, reason: impl Into<String>) -> Self {
        MatchResult {
            source_track: source,
            candidate_track: None,
            confidence,
            status: MatchStatus::NoMatch,
            reason: reason.into(),
        }
    }

    pub fn is_match(&self) -> bool {
        self.status != MatchStatus::NoMatch
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, &self.candidate_track) {
            (MatchStatus::NoMatch, _) | (_, None) => {
                write!(f, "[no match] {} ({})", self.source_track, self.reason)
            }
            (status, Some(candidate)) => write!(
                f,
                "[{}] {} -> {} ({:.2})",
                status, self.source_track, candidate, self.confidence
            ),
        }
    }
}
