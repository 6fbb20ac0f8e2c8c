use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use dissonant::bridge_desktop::{ReqwestHttpClient, TokioBackgroundExecutor};
use dissonant::bridge_traits::time::{Clock, SystemClock};
use dissonant::core_library::db::{create_pool, DatabaseConfig};
use dissonant::core_library::repositories::{
    AlbumRepository, InventoryRepository, PageRequest, SqliteAlbumRepository,
    SqliteInventoryRepository,
};
use dissonant::core_runtime::{init_logging, CoreConfig, LoggingConfig};
use dissonant::core_sync::{SyncCoordinator, SyncJob, SyncScheduler};
use dissonant::provider_discogs::DiscogsConnector;

#[derive(Parser, Debug)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name = "dissonant-sync",
  about = env!("CARGO_PKG_DESCRIPTION"),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one sync pass now
    Sync,

    /// Sync on the configured interval until interrupted
    Schedule,

    /// List inventory records
    Inventory(ListOptions),

    /// List catalog albums
    Albums(ListOptions),
}

#[derive(Parser, Debug, Clone, Copy)]
struct ListOptions {
    /// Page to show, starting at 1
    #[clap(long, default_value_t = 1)]
    page: u32,

    #[clap(long, default_value_t = 50)]
    page_size: u32,
}

impl ListOptions {
    fn page_request(self) -> PageRequest {
        PageRequest::new(self.page.saturating_sub(1), self.page_size)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the process environment still applies.
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    let config = CoreConfig::from_env().context("Invalid configuration")?;

    init_logging(
        LoggingConfig::default()
            .with_level(config.log_level)
            .with_format(config.log_format),
    )
    .context("Failed to initialise logging")?;

    let pool = create_pool(DatabaseConfig::new(&config.database_path))
        .await
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;
    let albums: Arc<dyn AlbumRepository> = Arc::new(SqliteAlbumRepository::new(pool.clone()));
    let inventory: Arc<dyn InventoryRepository> = Arc::new(SqliteInventoryRepository::new(pool));

    match cli.command {
        Command::Sync => {
            let coordinator = build_coordinator(&config, albums, inventory)?;
            let job = coordinator.run_sync().await?;
            print_summary(&job);
        }
        Command::Schedule => {
            let coordinator = Arc::new(build_coordinator(&config, albums, inventory)?);
            let scheduler = SyncScheduler::new(
                coordinator,
                Arc::new(TokioBackgroundExecutor::new()),
                config.sync_interval,
            );
            scheduler.start().await?;

            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
            info!("Shutting down");
            scheduler.stop().await?;
        }
        Command::Inventory(options) => {
            let page = inventory.query(options.page_request()).await?;
            println!("{:<12} {:>4}  {} - {}", "RELEASE", "QTY", "ARTIST", "ALBUM");
            for record in &page.items {
                println!(
                    "{:<12} {:>4}  {} - {}",
                    record.discogs_id, record.quantity, record.artist, record.album_name
                );
            }
            println!("page {}/{} ({} records)", page.page + 1, page.total_pages.max(1), page.total);
        }
        Command::Albums(options) => {
            let page = albums.query(options.page_request()).await?;
            for album in &page.items {
                println!(
                    "{} - {} [{}] {} {}",
                    album.artist, album.album_name, album.release_year, album.label, album.country
                );
            }
            println!("page {}/{} ({} albums)", page.page + 1, page.total_pages.max(1), page.total);
        }
    }

    Ok(())
}

fn build_coordinator(
    config: &CoreConfig,
    albums: Arc<dyn AlbumRepository>,
    inventory: Arc<dyn InventoryRepository>,
) -> Result<SyncCoordinator> {
    if !config.discogs.has_credentials() {
        warn!("DISCOGS_USERNAME or DISCOGS_TOKEN is not set; Discogs will reject the requests");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let http_client = Arc::new(ReqwestHttpClient::new()?);
    let connector = Arc::new(DiscogsConnector::with_clock(
        http_client,
        config.discogs.clone(),
        Arc::clone(&clock),
    ));

    Ok(SyncCoordinator::new(
        connector,
        albums,
        inventory,
        clock,
        config.discogs.max_pages,
    ))
}

fn print_summary(job: &SyncJob) {
    let stats = &job.stats;
    println!(
        "sync {} {}: {} releases, {} albums created, {} updated, {} inventory created, {} incremented",
        job.id,
        job.status,
        stats.releases_seen,
        stats.albums_created,
        stats.albums_updated,
        stats.inventory_created,
        stats.inventory_incremented
    );
}
