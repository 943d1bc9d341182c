use anyhow::{bail, Result};
use clap::Parser;

use tracksync::{
    classify, init_logging, match_confidence, plan, CandidateRetriever, Config, RetrieverOptions, SpotifyClient, StaticToken, Track,
};

/// Look up catalog alternatives for a single track.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    title: String,

    artist: String,

    /// Mix or edit name, e.g. "Extended Mix"
    #[arg(long)]
    mix: Option<String>,

    #[arg(long)]
    isrc: Option<String>,

    /// Track length in seconds
    #[arg(long)]
    duration: Option<u32>,

    #[arg(long)]
    album: Option<String>,

    #[arg(long)]
    year: Option<i32>,

    #[arg(long)]
    label: Option<String>,

    /// Remixer credit; may be repeated
    #[arg(long = "remixer")]
    remixers: Vec<String>,

    /// Print the search plan without contacting the catalog
    #[arg(long)]
    plan: bool,

    #[arg(long)]
    no_duration_filter: bool,

    #[arg(long)]
    market: Option<String>,

    #[arg(long, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn track(&self) -> Track {
        let mut track = Track::new(self.title.as_str(), self.artist.as_str())
            .with_source("manual")
            .with_mix_name(self.mix.clone())
            .with_remixers(self.remixers.clone());
        if let Some(isrc) = &self.isrc {
            track = track.with_isrc(isrc.as_str());
        }
        if let Some(duration) = self.duration {
            track = track.with_duration(duration);
        }
        if let Some(album) = &self.album {
            track = track.with_album(album.as_str());
        }
        if let Some(year) = self.year {
            track = track.with_year(year);
        }
        if let Some(label) = &self.label {
            track = track.with_label(label.as_str());
        }
        track
    }
}

fn format_duration(seconds: Option<u32>) -> String {
    match seconds {
        Some(s) => format!("{}:{:02}", s / 60, s % 60),
        None => "--:--".to_string(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let track = args.track();
    track.validate()?;

    if args.plan {
        for step in plan(&track) {
            println!("{}:", step.strategy);
            for query in &step.queries {
                println!("  {}", query);
            }
        }
        return Ok(());
    }

    let mut config = Config::load_or_default();
    if args.no_duration_filter {
        config.duration_filter = Some(false);
    }
    if args.market.is_some() {
        config.market = args.market.clone();
    }

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

    let retrieval = retriever.retrieve(&track);
    match &retrieval.hit {
        Some((strategy, query)) => println!("{} candidate(s) via {}: {}", retrieval.candidates.len(), strategy, query),
        None => {
            println!("No candidates found for {} ({} requests)", track, retrieval.requests);
            return Ok(());
        }
    }
    if retrieval.failures > 0 {
        println!("({} of {} requests failed)", retrieval.failures, retrieval.requests);
    }
    println!();

    for candidate in &retrieval.candidates {
        let confidence = match_confidence(&track, candidate);
        println!(
            "{:.3}  {:<8}  {} - {}  [{}]  {}",
            confidence,
            classify(confidence, config.min_confidence()).as_str(),
            candidate.artist,
            candidate.title,
            format_duration(candidate.duration_seconds),
            candidate.external_id.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
