use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::sync::mpsc;
use tracing::info;

use ratioed::config::Config;
use ratioed::coordinator::Coordinator;
use ratioed::page::snapshot::load_snapshot;
use ratioed::protocol::{Request, TabId};
use ratioed::session::{PageSession, SessionOptions};
use ratioed::settings::Settings;
use ratioed::stats::YouTubeStatsClient;
use ratioed::store::{self, SqliteStore, Store};

/// Ratioed: like-ratio annotations for YouTube video listings.
///
/// Scans video listing pages (YouTube and Google search results), fetches
/// view/like counts for every visible video, and prefixes each title with
/// its like ratio, color-coded by magnitude.
#[derive(Parser)]
#[command(name = "ratioed", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Scan a page snapshot and annotate its video titles
    Scan {
        /// Path to a JSON page snapshot
        snapshot: PathBuf,

        /// The URL the snapshot was captured from
        #[arg(long)]
        url: String,

        /// Override the minimum ratio threshold (percent) for this scan
        #[arg(long)]
        min_ratio: Option<f64>,

        /// Override the candidate cap for this scan
        #[arg(long)]
        max_results: Option<u32>,
    },

    /// Run the host loop: length-prefixed JSON frames on stdin/stdout
    Serve,

    /// Show the last scan's stored results
    Results,

    /// Show or update saved settings
    Settings {
        /// YouTube Data API key
        #[arg(long)]
        api_key: Option<String>,

        /// Minimum like ratio (percent) a video must reach to be annotated
        #[arg(long)]
        min_ratio: Option<f64>,

        /// Cap on candidates per full scan
        #[arg(long)]
        max_results: Option<u32>,

        /// Master toggle (true/false)
        #[arg(long)]
        enabled: Option<bool>,
    },

    /// Drop the stored result snapshot
    Clear,

    /// Show system status (settings, stored results, last scan)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Structured logging on stderr; stdout stays clean for frames and tables
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ratioed=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing ratioed database...");
            let config = Config::load()?;
            let store = init_store(&config)?;
            let table_count = store.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nRatioed is ready. Next step: save your YouTube API key:");
            println!("  ratioed settings --api-key <KEY>");
            println!("\nThen run: ratioed scan <snapshot.json> --url <page-url>");
        }

        Commands::Scan {
            snapshot,
            url,
            min_ratio,
            max_results,
        } => {
            let config = Config::load()?;
            let store = open_store(&config)?;

            let mut settings = effective_settings(&config, &store).await?;
            config.require_api_key(&settings.api_key)?;
            if let Some(min_ratio) = min_ratio {
                settings.min_ratio = min_ratio;
            }
            if let Some(max_results) = max_results {
                settings.max_results = max_results;
            }
            settings.validate()?;

            let dom = load_snapshot(&snapshot)?;
            let provider = Arc::new(YouTubeStatsClient::new(
                config.api_url.clone(),
                Arc::clone(&store),
            ));

            // the CLI has no frame peer; scan events are drained and dropped
            let (events_tx, mut events_rx) = mpsc::unbounded_channel();
            tokio::spawn(async move { while events_rx.recv().await.is_some() {} });

            let session = PageSession::new(
                TabId(0),
                settings.shared(),
                provider,
                Arc::clone(&store),
                events_tx,
                SessionOptions {
                    show_progress: true,
                    ..SessionOptions::default()
                },
            );

            let loaded = session
                .handle(Request::PageLoaded {
                    url: url.clone(),
                    dom: Some(dom),
                })
                .await;
            if !loaded.success {
                anyhow::bail!(
                    "Failed to load snapshot: {}",
                    loaded.error.as_deref().unwrap_or("unknown error")
                );
            }

            println!("Scanning {}...", url);
            let summary = session.scan_now().await?;

            ratioed::output::terminal::display_scan_summary(&summary);
            ratioed::output::terminal::display_results(&session.results().await);
        }

        Commands::Serve => {
            let config = Config::load()?;
            let store = open_store(&config)?;
            let settings = effective_settings(&config, &store).await?;
            let provider = Arc::new(YouTubeStatsClient::new(
                config.api_url.clone(),
                Arc::clone(&store),
            ));

            let (coordinator, events) = Coordinator::new(
                settings,
                Arc::clone(&store),
                provider,
                SessionOptions::default(),
            );
            ratioed::host::serve(coordinator, events, tokio::io::stdin(), tokio::io::stdout())
                .await?;
        }

        Commands::Results => {
            let config = Config::load()?;
            let store = open_store(&config)?;
            let results = store.get_results().await?;
            ratioed::output::terminal::display_results(&results);
        }

        Commands::Settings {
            api_key,
            min_ratio,
            max_results,
            enabled,
        } => {
            let config = Config::load()?;
            let store = open_store(&config)?;
            let mut settings = store.get_settings().await?;

            let changed =
                api_key.is_some() || min_ratio.is_some() || max_results.is_some() || enabled.is_some();
            if let Some(api_key) = api_key {
                settings.api_key = api_key;
            }
            if let Some(min_ratio) = min_ratio {
                settings.min_ratio = min_ratio;
            }
            if let Some(max_results) = max_results {
                settings.max_results = max_results;
            }
            if let Some(enabled) = enabled {
                settings.enabled = enabled;
            }

            if changed {
                settings.validate()?;
                store.save_settings(&settings).await?;
                println!("{}", "Settings saved.".bold());
            }
            print_settings(&settings);
        }

        Commands::Clear => {
            let config = Config::load()?;
            let store = open_store(&config)?;
            store.save_results(&[]).await?;
            println!("Stored results cleared.");
        }

        Commands::Status => {
            let config = Config::load()?;
            let store = open_store(&config)?;
            ratioed::status::show(&store, &config.db_path).await?;
        }
    }

    Ok(())
}

/// Create (or migrate) the database and wrap it in the Store trait.
fn init_store(config: &Config) -> Result<Arc<dyn Store>> {
    let conn = store::initialize(&config.db_path)?;
    Ok(Arc::new(SqliteStore::new(conn)))
}

/// Open the existing database; tells the user to init when it's missing.
fn open_store(config: &Config) -> Result<Arc<dyn Store>> {
    let conn = store::open(&config.db_path)?;
    Ok(Arc::new(SqliteStore::new(conn)))
}

/// Saved settings, seeded with the env API key when none is saved yet.
async fn effective_settings(config: &Config, store: &Arc<dyn Store>) -> Result<Settings> {
    let mut settings = store.get_settings().await?;
    if settings.api_key.is_empty() && !config.api_key.is_empty() {
        settings.api_key = config.api_key.clone();
        store.save_settings(&settings).await?;
        info!("Seeded API key from YOUTUBE_API_KEY");
    }
    Ok(settings)
}

fn print_settings(settings: &Settings) {
    let key_state = if settings.api_key.is_empty() {
        "not set".to_string()
    } else {
        format!("set ({} chars)", settings.api_key.len())
    };
    println!("  API key: {key_state}");
    println!("  Minimum ratio: {}%", settings.min_ratio);
    println!("  Max results: {}", settings.max_results);
    println!(
        "  Extension: {}",
        if settings.enabled { "enabled" } else { "disabled" }
    );
}
