use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use propfeed::{
    filter, FeedConfig, FilterCriteria, LoadOptions, PropertyCache, PropertyFeed, SourceSelector,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "propfeed",
    about = "propfeed — fetch and inspect aggregated property listings",
    version
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one page of listings from the configured sources
    Fetch {
        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: u32,
        /// Records per page (capped at 50)
        #[arg(long, default_value = "12")]
        limit: u32,
        /// Which upstream(s) to query: all, mongodb or woocommerce
        #[arg(long, default_value = "all")]
        source: SourceSelector,
        /// Keep only listings whose location contains this text
        #[arg(long)]
        location: Option<String>,
        /// Minimum price
        #[arg(long)]
        min_price: Option<u64>,
        /// Maximum price
        #[arg(long)]
        max_price: Option<u64>,
        /// Minimum number of bedrooms
        #[arg(long)]
        bedrooms: Option<u32>,
        /// Minimum number of bathrooms
        #[arg(long)]
        bathrooms: Option<u32>,
        /// Minimum surface in square meters
        #[arg(long)]
        min_size: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Fetch {
            page,
            limit,
            source,
            location,
            min_price,
            max_price,
            bedrooms,
            bathrooms,
            min_size,
        } => {
            let criteria = FilterCriteria {
                location,
                min_price,
                max_price,
                bedrooms,
                bathrooms,
                min_size,
            };
            fetch_cmd(page, limit, source, criteria, cli.json).await
        }
    }
}

async fn fetch_cmd(
    page: u32,
    limit: u32,
    source: SourceSelector,
    criteria: FilterCriteria,
    json: bool,
) -> Result<()> {
    let config = FeedConfig::from_env()?;
    let cache = Arc::new(PropertyCache::new(config.cache_ttl, config.cache_capacity));
    // Periodic sweep for the life of the process; it ends with the cache.
    let _sweeper = cache.spawn_sweeper();
    let feed = PropertyFeed::new(config, cache);

    feed.load(page, limit, source, LoadOptions::default()).await;
    let state = feed.state();

    if let Some(error) = state.error {
        bail!("fetch failed: {error}");
    }

    let listings = filter(&state.properties, &criteria);
    if json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    for p in &listings {
        println!(
            "{:<12} {:<30} {:<24} {:>10}  {}bd/{}ba {:>4}m²  [{}]",
            p.id, p.title, p.location, p.price, p.bedrooms, p.bathrooms, p.size, p.source
        );
    }
    println!(
        "page {} ({} fetched, {} shown{})",
        state.page,
        state.total,
        listings.len(),
        if state.has_more { ", more available" } else { "" }
    );
    Ok(())
}
