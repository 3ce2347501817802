//! repack-search CLI - game catalog search from the command line.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use repack_search::{
    AggregatedResult, Aggregator, Candidate, FetchConfig, HttpFetcher, Metadata,
    MetadataExtractor, PageFetcher, QueryIntent, SearchQuery, SourceConfig, SourceId,
};

/// repack-search - find a game across repack catalogs
#[derive(Parser)]
#[command(name = "repack-search")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search every catalog for a game
    Search(SearchArgs),

    /// List the catalogs searched
    Sources,
}

#[derive(Parser)]
struct SearchArgs {
    /// Game title; add "online" to prefer online games
    query: String,

    /// Fetch size, magnets and download links for each hit
    #[arg(short, long)]
    metadata: bool,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value = "15")]
    timeout: u64,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
}

#[derive(Serialize)]
struct Hit<'a> {
    #[serde(flatten)]
    candidate: &'a Candidate,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata>,
}

#[derive(Serialize)]
struct Report<'a> {
    query: &'a str,
    #[serde(flatten)]
    result: &'a AggregatedResult,
    hits: Vec<Hit<'a>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Search(args) => run_search(args).await,
        Commands::Sources => list_sources(),
    }
}

fn list_sources() -> Result<()> {
    let aggregator = Aggregator::with_defaults(Arc::new(HttpFetcher::new()?));
    println!("Catalogs searched:\n");
    for line in source_lines(&aggregator) {
        println!("  {}", line);
    }
    println!();
    println!("Usage: repack-search search \"elden ring\" --metadata");
    Ok(())
}

/// One line per configured source: shortcut, name and site.
fn source_lines(aggregator: &Aggregator) -> Vec<String> {
    let mut configs: Vec<&SourceConfig> = SourceId::ALL
        .into_iter()
        .filter_map(|source| aggregator.adapter(source))
        .map(|adapter| adapter.config())
        .collect();
    configs.extend(aggregator.play_time_lookup().map(|lookup| lookup.config()));

    configs
        .into_iter()
        .map(|config| {
            let state = if config.enabled { "" } else { " (disabled)" };
            format!(
                "{:<6}- {} ({}){}",
                config.shortcut, config.name, config.base_url, state
            )
        })
        .collect()
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let query = SearchQuery::new(&args.query)?;

    let config = FetchConfig::default().with_timeout(Duration::from_secs(args.timeout));
    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::with_config(config)?);
    let aggregator = Aggregator::with_defaults(fetcher.clone());

    let result = aggregator.aggregate(query.as_str()).await;

    let extractor = MetadataExtractor::new(fetcher);
    let mut hits = Vec::new();
    for candidate in result.ordered() {
        let metadata = if args.metadata {
            Some(extractor.fetch_metadata(&candidate.url, candidate.source).await)
        } else {
            None
        };
        hits.push(Hit {
            candidate,
            metadata,
        });
    }

    match args.format {
        OutputFormat::Text => print_text(query.as_str(), &result, &hits),
        OutputFormat::Json => {
            let report = Report {
                query: query.as_str(),
                result: &result,
                hits,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn print_text(query: &str, result: &AggregatedResult, hits: &[Hit<'_>]) {
    match result.intent {
        QueryIntent::Conversational => {
            println!("\"{}\" looks like conversation, not a game title.", query);
            return;
        }
        QueryIntent::DownloadTime => {
            println!("\"{}\" looks like a download-time request (size, speed).", query);
            return;
        }
        QueryIntent::Search => {}
    }

    if hits.is_empty() {
        println!("\nNo catalog has \"{}\".", query);
    } else {
        println!("\nResults for \"{}\":\n", query);
    }

    for (i, hit) in hits.iter().enumerate() {
        let candidate = hit.candidate;
        let check = if candidate.verified { " (verified)" } else { "" };
        println!("{}. [{}] {}{}", i + 1, candidate.source, candidate.title, check);
        println!("   URL: {}", candidate.url);
        println!("   Score: {:.2}", candidate.score);

        if let Some(metadata) = &hit.metadata {
            if let Some(size) = &metadata.size {
                println!("   Size: {}", size);
            }
            if let Some(date) = &metadata.release_date {
                println!("   Released: {}", date);
            }
            for magnet in metadata.magnet_links.iter().take(3) {
                println!("   Magnet: {}", magnet);
            }
            for link in &metadata.download_links {
                println!("   {}: {}", link.label, link.url);
            }
        }
        println!();
    }

    if let Some(play_time) = &result.play_time {
        println!("How long to beat {}:", play_time.title);
        for (label, hours) in play_time.entries() {
            println!("   {}: {:.1} h", label, hours);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_lines_follow_adapter_configs() {
        let aggregator = Aggregator::with_defaults(Arc::new(HttpFetcher::new().unwrap()));
        let lines = source_lines(&aggregator);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "fg    - FitGirl (https://fitgirl-repacks.site)");
        assert!(lines[1].starts_with("dodi  - DODI"));
        assert!(lines[2].starts_with("g3    - Game3rb"));
        assert!(lines[3].starts_with("hltb  - HowLongToBeat"));
    }

    #[test]
    fn test_source_lines_empty_aggregator() {
        assert!(source_lines(&Aggregator::new()).is_empty());
    }
}
