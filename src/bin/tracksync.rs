use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use tracksync::{
    default_playlist_name, find_matches, init_logging, materialize, playlist_description, read_playlist, report,
    CandidateRetriever, Config, RetrieverOptions, SpotifyClient, StaticToken,
};

/// Match a DJ tracklist against the Spotify catalog and write the matches to a playlist.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Playlist JSON: {"name": ..., "source": ..., "tracks": [...]}
    #[arg(required_unless_present_any = ["save_defaults", "show_saved_defaults"])]
    input: Option<PathBuf>,

    /// Target playlist name [default: "Tracklist Sync: <name>"]
    #[arg(long)]
    name: Option<String>,

    /// Lowest confidence accepted as a fuzzy match (0.0 - 1.0)
    #[arg(long, value_parser = parse_confidence)]
    min_confidence: Option<f64>,

    /// Do not narrow search results by track length
    #[arg(long)]
    no_duration_filter: bool,

    /// Create the playlist as public
    #[arg(long)]
    public: bool,

    /// Country code for catalog searches, e.g. "DE"
    #[arg(long)]
    market: Option<String>,

    /// Minimum time between catalog requests
    #[arg(long)]
    request_interval_ms: Option<u64>,

    /// Bearer token for the Spotify Web API
    #[arg(long, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Match and report only; leave playlists alone
    #[arg(long)]
    dry_run: bool,

    /// Print the match results as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Save the given options as defaults and exit
    #[arg(long)]
    save_defaults: bool,

    /// Show saved defaults and exit
    #[arg(long)]
    show_saved_defaults: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_confidence(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("{:?} is not a number", s))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("{} is outside 0.0 - 1.0", value));
    }
    Ok(value)
}

impl Args {
    /// Options given on the command line, as a config overlay.
    fn as_config(&self) -> Config {
        Config {
            min_confidence: self.min_confidence,
            duration_filter: self.no_duration_filter.then_some(false),
            playlist_public: self.public.then_some(true),
            request_interval_ms: self.request_interval_ms,
            market: self.market.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let saved_config = Config::load_or_default();

    if args.show_saved_defaults {
        let path = Config::get_config_path()?;
        if path.exists() {
            println!("Saved defaults from {:?}:", path);
            println!();
            saved_config.print("Configuration");
        } else {
            println!("No saved defaults file found at {:?}", path);
            println!("Use --save-defaults to create one.");
        }
        return Ok(());
    }

    let mut config = saved_config;
    config.merge(&args.as_config());

    if args.save_defaults {
        config.save().map_err(|e| anyhow::anyhow!("saving defaults: {}", e))?;
        println!("Defaults saved to {:?}", Config::get_config_path()?);
        println!();
        config.print("Saved configuration");
        return Ok(());
    }

    let Some(input) = &args.input else {
        bail!("no input playlist given");
    };
    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let playlist = read_playlist(BufReader::new(file)).with_context(|| format!("reading {}", input.display()))?;
    info!("loaded {}", playlist);

    let Some(token) = args.token.clone() else {
        bail!("no access token: set SPOTIFY_ACCESS_TOKEN or pass --token");
    };
    let client = SpotifyClient::new(Box::new(StaticToken(token)))
        .with_request_interval(config.request_interval_ms())
        .with_market(config.market.clone());

    let retriever = CandidateRetriever::with_options(
        &client,
        RetrieverOptions { duration_filter: config.duration_filter() },
    );
    let results = find_matches(&retriever, &playlist.tracks, Vec::new(), config.min_confidence());
    let summary = report(&results);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    if args.dry_run {
        info!("dry run: no playlist changes");
        return Ok(());
    }

    if summary.matched() == 0 {
        bail!("none of the {} tracks matched; no playlist written", summary.total());
    }

    let name = args.name.clone().unwrap_or_else(|| default_playlist_name(&playlist.name));
    let outcome = materialize(
        &client,
        &name,
        &playlist_description(&playlist.name),
        config.playlist_public(),
        &results,
    )
    .with_context(|| format!("writing playlist {:?}", name))?;

    if let Some(outcome) = outcome {
        println!(
            "{} playlist {:?} ({}): {} tracks added, {} unmatched",
            if outcome.reused { "Updated" } else { "Created" },
            outcome.playlist.name,
            outcome.playlist.id,
            outcome.added,
            summary.unmatched
        );
    }
    Ok(())
}
