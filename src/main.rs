mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use cli::{Cli, Commands};
use flixrecom::banner::{BannerRotation, BannerSelector};
use flixrecom::discovery::{genres_for, DiscoverFilters, DiscoveryGrid};
use flixrecom::search::search;
use flixrecom::{AppSettings, Category, ContentItem, Locale, TmdbClient};

fn log_item(client: &TmdbClient, item: &ContentItem) {
    let enrichment = item.enrichment.clone().unwrap_or_default();
    tracing::info!(
        id = %item.id,
        media_type = %item.media_type,
        kind = %item.kind,
        date = ?item.release_date,
        trailer = ?enrichment.trailer_key,
        cast = ?enrichment.cast,
        platforms = ?enrichment.streaming_platforms,
        rent = enrichment.watch_providers.rent.len(),
        buy = enrichment.watch_providers.buy.len(),
        season = ?enrichment.latest_season.map(|s| s.season_number),
        backdrop = %client.backdrop_url(item.backdrop_path.as_deref()),
        "{}",
        item.title
    );
}

async fn run_banner(settings: AppSettings, client: Arc<TmdbClient>, cycles: usize) -> Result<()> {
    let selector = BannerSelector::new(client.clone(), Locale::from_settings(&settings));
    let (handle, task) = BannerRotation::new(selector, &settings).spawn();
    let mut state = handle.subscribe();
    let mut published = 0;
    let mut last_id: Option<String> = None;

    while published < cycles {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = state.borrow_and_update().current.clone();
                if let Some(item) = current {
                    if last_id.as_deref() != Some(item.id.as_str()) {
                        published += 1;
                        last_id = Some(item.id.clone());
                        log_item(&client, &item);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    handle.shutdown();
    task.await.context("banner task panicked")?;
    Ok(())
}

async fn run_grid(
    settings: AppSettings,
    client: Arc<TmdbClient>,
    category: Category,
    filters: DiscoverFilters,
) -> Result<()> {
    let mut grid = DiscoveryGrid::new(client.clone(), Locale::from_settings(&settings))
        .with_selection(category, filters);
    grid.load_genres().await;
    grid.refresh()
        .await
        .with_context(|| format!("failed to load {} grid", category))?;

    tracing::info!("{} items in {} grid", grid.items().len(), category);
    for item in grid.items() {
        log_item(&client, item);
    }
    Ok(())
}

async fn run_search(settings: AppSettings, client: Arc<TmdbClient>, query: &str) -> Result<()> {
    let outcome = search(
        client.as_ref(),
        query,
        &Locale::from_settings(&settings),
        Local::now().date_naive(),
    )
    .await;
    if let Some(message) = &outcome.message {
        tracing::warn!("{}", message);
    }
    for item in &outcome.results {
        log_item(&client, item);
    }
    Ok(())
}

async fn run_genres(settings: AppSettings, client: Arc<TmdbClient>, category: Category) -> Result<()> {
    let genres = genres_for(client.as_ref(), category, &Locale::from_settings(&settings))
        .await
        .context("failed to load genres")?;
    for genre in genres {
        tracing::info!(id = genre.id, "{}", genre.name);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "flixrecom=debug".to_string()
        } else {
            "flixrecom=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let settings = AppSettings::load(cli.config.as_deref())?;
    let client = Arc::new(TmdbClient::from_settings(&settings));
    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Banner { cycles } => rt.block_on(run_banner(settings, client, cycles)),
        Commands::Grid {
            category,
            genre,
            year,
        } => rt.block_on(run_grid(
            settings,
            client,
            category,
            DiscoverFilters { genre, year },
        )),
        Commands::Search { query } => rt.block_on(run_search(settings, client, &query.join(" "))),
        Commands::Genres { category } => rt.block_on(run_genres(settings, client, category)),
    }
}
