use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::matcher::DEFAULT_MIN_CONFIDENCE;

/// Default time between catalog requests.
pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 100;

/// Persisted defaults for the command-line tools. Unset fields fall back to
/// the built-in defaults or to command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_filter: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_public: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_interval_ms: Option<u64>,

    /// Two-letter country code passed to catalog searches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// `~/.config/tracksync/defaults.toml`
    pub fn get_config_path() -> Result<PathBuf, io::Error> {
        let home = std::env::var("HOME")
            .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "HOME environment variable not set"))?;

        Ok(Path::new(&home).join(".config").join("tracksync").join("defaults.toml"))
    }

    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// A missing file yields an empty config.
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if !path.exists() {
            return Ok(Config::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saved defaults, or an empty config (with a warning) when they cannot be read.
    pub fn load_or_default() -> Self {
        match Self::get_config_path() {
            Ok(path) => Self::load_from_or_default(&path),
            Err(e) => {
                warn!("ignoring saved defaults: {}", e);
                Config::new()
            }
        }
    }

    pub fn load_from_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_else(|e| {
            warn!("ignoring saved defaults in {}: {}", path.display(), e);
            Config::new()
        })
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), io::Error> {
        if let Some(c) = self.min_confidence {
            if !(0.0..=1.0).contains(&c) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("min_confidence must be within 0.0..=1.0, got {}", c),
                ));
            }
        }
        Ok(())
    }

    /// Merge another config into this one; values set in `other` win.
    pub fn merge(&mut self, other: &Config) {
        if other.min_confidence.is_some() {
            self.min_confidence = other.min_confidence;
        }
        if other.duration_filter.is_some() {
            self.duration_filter = other.duration_filter;
        }
        if other.playlist_public.is_some() {
            self.playlist_public = other.playlist_public;
        }
        if other.request_interval_ms.is_some() {
            self.request_interval_ms = other.request_interval_ms;
        }
        if other.market.is_some() {
            self.market = other.market.clone();
        }
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE)
    }

    pub fn duration_filter(&self) -> bool {
        self.duration_filter.unwrap_or(true)
    }

    pub fn playlist_public(&self) -> bool {
        self.playlist_public.unwrap_or(false)
    }

    pub fn request_interval_ms(&self) -> u64 {
        self.request_interval_ms.unwrap_or(DEFAULT_REQUEST_INTERVAL_MS)
    }

    pub fn print(&self, title: &str) {
        println!("{}:", title);

        if let Some(c) = self.min_confidence {
            println!("  Min confidence:     {:.2}", c);
        }
        if let Some(filter) = self.duration_filter {
            println!("  Duration filter:    {}", if filter { "enabled" } else { "disabled" });
        }
        if let Some(public) = self.playlist_public {
            println!("  Playlist:           {}", if public { "public" } else { "private" });
        }
        if let Some(ms) = self.request_interval_ms {
            println!("  Request interval:   {} ms", ms);
        }
        if let Some(market) = &self.market {
            println!("  Market:             {}", market);
        }
    }
}
