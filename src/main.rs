use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use yt_history_scraper::capture::{load_har, replay};
use yt_history_scraper::session::extract_firefox_session;
use yt_history_scraper::{Config, HistoryStore, ScrapeRun, SnapshotPage};

#[derive(Parser)]
#[command(name = "yt-history")]
#[command(version, about = "Keep a local, deduplicated copy of your YouTube watch history")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to yt-history.toml lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy YouTube cookies from the local Firefox profile into the session directory
    ExtractCookie {
        /// Firefox profiles directory (auto-detected by default)
        #[arg(long)]
        profiles_dir: Option<PathBuf>,

        /// Where to write the captured session
        #[arg(long)]
        session_dir: Option<PathBuf>,
    },
    /// Merge a saved history page into the dataset
    Scrape {
        /// History page snapshots, one per scroll state, oldest scroll first
        #[arg(long = "snapshot", required = true)]
        snapshots: Vec<PathBuf>,

        /// HAR recording of the page's network traffic, for subtitle capture
        #[arg(long)]
        har: Option<PathBuf>,

        /// Dataset file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of scrolls before reading the page
        #[arg(long)]
        max_scrolls: Option<u32>,
    },
    /// Show dataset statistics
    Stats {
        /// Dataset file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("yt_history_scraper=debug,yt_history=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "yt_history_scraper={level},yt_history={level},warn",
                level = config.logging.log_level
            ))
        })
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::ExtractCookie {
            profiles_dir,
            session_dir,
        } => {
            let session_dir = session_dir.unwrap_or(config.storage.session_dir);
            info!("🍪 Capturing Firefox session into {}", session_dir.display());

            let count = tokio::task::spawn_blocking(move || {
                extract_firefox_session(profiles_dir.as_deref(), &session_dir)
            })
            .await??;
            println!("Captured {} YouTube cookies", count);
        }
        Commands::Scrape {
            snapshots,
            har,
            output,
            max_scrolls,
        } => {
            if let Some(output) = output {
                config.storage.output_path = output;
            }
            if let Some(max_scrolls) = max_scrolls {
                config.scrape.max_scrolls = max_scrolls;
            }
            info!("{}", config.summary());

            let responses = match har {
                Some(path) => load_har(&path)
                    .await
                    .with_context(|| format!("Failed to load HAR file {}", path.display()))?,
                None => Vec::new(),
            };

            let run = ScrapeRun::new(config)?;
            let mut page = SnapshotPage::new(snapshots)?;
            let (tx, rx) = run.interception_channel();
            let feeder = tokio::spawn(replay(responses, tx));

            let report = run.execute(&mut page, rx).await?;
            feeder.abort();

            println!("{}", report);
        }
        Commands::Stats { output } => {
            let path = output.unwrap_or(config.storage.output_path);
            let stats = HistoryStore::new(&path).stats().await;

            println!("Dataset: {}", path.display());
            println!("  Records:        {}", stats.total);
            println!("  With subtitles: {}", stats.with_subtitles);
            println!("  Shorts:         {}", stats.shorts);
        }
    }

    Ok(())
}
