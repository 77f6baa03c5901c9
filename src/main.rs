//! Mediadex command line.
//!
//! Loads the configured provider catalogs, aggregates them per content kind
//! and answers searches against the result. `watch` keeps refreshing on the
//! configured interval until interrupted.

mod error;
mod setup;

use crate::error::{ErrorKind, Result};
use clap::{Parser, Subcommand};
use exn::ResultExt;
use mediadex_aggregator::{LogicalContent, Registry, schedule};
use mediadex_config::Config;
use mediadex_identity::{ContentRef, Identity, Kind};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Labels longer than this are cut with an ellipsis.
const LABEL_CHARS: usize = 80;

#[derive(Parser, Debug)]
#[command(name = "mediadex", version, about = "Aggregated manga, anime and webtoon catalog search")]
struct Args {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, value_name = "PATH", env = "MEDIADEX_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the catalog of one kind
    Search {
        /// manga, anime or webtoon
        #[arg(value_parser = parse_kind)]
        kind: Kind,
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Show everything known about one title, by identity or hash
    Retrieve {
        #[arg(value_parser = parse_reference)]
        reference: ContentRef,
    },
    /// Print the identity and hash of a title
    Hash {
        #[arg(value_parser = parse_kind)]
        kind: Kind,
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Refresh every kind once and print provider status
    Status,
    /// Keep refreshing on the configured interval until interrupted
    Watch,
}

fn parse_kind(s: &str) -> std::result::Result<Kind, String> {
    s.parse().map_err(|error: mediadex_identity::error::Error| error.to_string())
}

fn parse_reference(s: &str) -> std::result::Result<ContentRef, String> {
    s.parse().map_err(|error: mediadex_identity::error::Error| error.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    setup_tracing(args.verbose);
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:?}");
            ExitCode::FAILURE
        },
    }
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("mediadex=debug,mediadex_aggregator=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn run(args: Args) -> Result<()> {
    let path = args.config.as_deref();
    match args.command {
        Command::Hash { kind, name } => {
            let identity = Identity::new(kind, name.join(" "));
            println!("{identity}\t{}", identity.hash());
            Ok(())
        },
        Command::Search { kind, query } => search(&load(path)?.1, kind, &query.join(" ")).await,
        Command::Retrieve { reference } => retrieve(&load(path)?.1, &reference).await,
        Command::Status => {
            status(&load(path)?.1).await;
            Ok(())
        },
        Command::Watch => {
            let (config, registry) = load(path)?;
            watch(registry, &config).await
        },
    }
}

fn load(path: Option<&Path>) -> Result<(Config, Registry)> {
    let config = Config::load(path).or_raise(|| ErrorKind::Config)?;
    let registry = setup::registry(&config).or_raise(|| ErrorKind::Setup)?;
    if registry.is_empty() {
        tracing::warn!("No providers configured");
    }
    Ok((config, registry))
}

async fn search(registry: &Registry, kind: Kind, query: &str) -> Result<()> {
    let Some(aggregator) = registry.get(kind) else {
        exn::bail!(ErrorKind::Argument(format!("no providers configured for {kind}")));
    };
    aggregator.refresh().await;
    for hit in aggregator.search(query).await {
        println!("{}\t{}", hit.hash, hit.label(LABEL_CHARS));
    }
    Ok(())
}

async fn retrieve(registry: &Registry, reference: &ContentRef) -> Result<()> {
    registry.refresh_all().await;
    let Some(content) = registry.retrieve(reference).await else {
        exn::bail!(ErrorKind::NotFound(reference.to_string()));
    };
    print_content(&content);
    Ok(())
}

fn print_content(content: &LogicalContent) {
    println!("{}", content.name());
    println!("  identity: {}", content.identity);
    println!("  hash:     {}", content.hash);
    let aliases = content.aliases();
    if !aliases.is_empty() {
        println!("  aliases:  {}", aliases.into_iter().collect::<Vec<_>>().join(", "));
    }
    let genres = content.genres();
    if !genres.is_empty() {
        println!("  genres:   {}", genres.into_iter().collect::<Vec<_>>().join(", "));
    }
    if let Some(description) = &content.entry.description {
        println!("  {description}");
    }
    for (language, providers) in content.languages() {
        println!("  [{language}] {}", providers.join(", "));
    }
    for provenance in &content.provenance {
        if let Some(url) = &provenance.entry.url {
            println!("  {}: {url}", provenance.provider);
        }
    }
}

async fn status(registry: &Registry) {
    registry.refresh_all().await;
    for (kind, aggregator) in registry.iter() {
        println!("{kind}");
        for status in aggregator.status() {
            let last_success = status.last_success.map(|at| at.to_string()).unwrap_or_else(|| "never".to_string());
            println!(
                "  {:<20} {:<8} {:>6} entries  last success: {last_success}",
                status.provider, status.health, status.entries
            );
            if let Some(error) = status.last_error {
                println!("  {:<20} {error}", "");
            }
        }
    }
}

async fn watch(registry: Registry, config: &Config) -> Result<()> {
    let cancel = CancellationToken::new();
    let task = schedule::spawn(Arc::new(registry), config.refresh.interval(), cancel.clone());
    tracing::info!(interval_secs = config.refresh.interval_secs, "Watching; press Ctrl-C to stop");
    let signal = tokio::signal::ctrl_c().await;
    cancel.cancel();
    if task.await.is_err() {
        tracing::warn!("Refresh schedule ended abnormally");
    }
    signal.or_raise(|| ErrorKind::Signal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        let args = Args::try_parse_from(["mediadex", "search", "manga", "one", "piece"]).unwrap();
        match args.command {
            Command::Search { kind, query } => {
                assert_eq!(kind, Kind::Manga);
                assert_eq!(query, ["one", "piece"]);
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_retrieve_hash() {
        let hash = Identity::new(Kind::Anime, "Naruto").hash();
        let reference = hash.to_string();
        let args = Args::try_parse_from(["mediadex", "retrieve", reference.as_str()]).unwrap();
        assert!(matches!(args.command, Command::Retrieve { reference: ContentRef::Hash(parsed) } if parsed == hash));
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        assert!(Args::try_parse_from(["mediadex", "search", "novel", "dune"]).is_err());
    }
}
