use anyhow::Result;
use clap::Parser;
use coinwatch::prelude::*;
use futures_util::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Poll CoinGecko conversion rates and keep a local snapshot")]
struct Args {
    /// REST API base URL
    #[arg(long, default_value = DEFAULT_API_URL)]
    base_url: String,

    /// Snapshot file (defaults to the platform cache directory)
    #[arg(long)]
    cache_path: Option<PathBuf>,

    /// Coin id to track (overrides the cached selection)
    #[arg(long)]
    coin: Option<String>,

    /// Quote currency (overrides the cached selection)
    #[arg(long)]
    currency: Option<String>,

    /// Days of history to fetch (overrides the cached selection)
    #[arg(long)]
    days: Option<u32>,

    /// Seconds between refreshes
    #[arg(long, default_value = "10")]
    interval_secs: u64,

    /// Connect timeout in seconds
    #[arg(long, default_value = "30")]
    connect_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut builder = CoinWatch::builder()
        .base_url(&args.base_url)
        .poll_interval(Duration::from_secs(args.interval_secs.max(1)))
        .connect_timeout(Duration::from_secs(args.connect_timeout_secs));
    if let Some(path) = &args.cache_path {
        builder = builder.cache_path(path.clone());
    }
    let mut watch = builder.build()?;

    let coordinator = watch.coordinator().clone();
    let feed = watch.event_feed();
    let reporter = tokio::spawn(async move {
        let mut events = feed.events();
        while let Some(event) = events.next().await {
            report(&coordinator, event).await;
        }
    });

    watch.start().await;

    // Flags override whatever the cache restored.
    let selection = watch.view().await.selection;
    if let Some(coin) = args.coin.filter(|c| c != selection.coin.as_str()) {
        watch.set_selected_coin(coin).await;
    }
    if let Some(currency) = args.currency.filter(|c| c != selection.currency.as_str()) {
        watch.set_selected_currency(currency).await;
    }
    if let Some(days) = args.days.filter(|d| *d != selection.history_window_days) {
        watch.set_history_window(days).await;
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    watch.stop().await;
    reporter.abort();
    Ok(())
}

async fn report(coordinator: &SyncCoordinator, event: SyncEvent) {
    match event {
        SyncEvent::Synced { sync_date } => {
            let view = coordinator.view().await;
            if let Some(rate) = view.latest_rate() {
                tracing::info!(
                    "1 {} = {} {} (synced {}, {} rates)",
                    view.selection.coin,
                    display_rate(&rate.rate),
                    view.selection.currency.as_str().to_uppercase(),
                    sync_date.format("%Y-%m-%d %H:%M:%S UTC"),
                    view.rates.len()
                );
            }
        }
        SyncEvent::SelectionChanged => {
            let selection = coordinator.selection().await;
            tracing::info!(
                "Tracking {} in {} over {} days",
                selection.coin,
                selection.currency,
                selection.history_window_days
            );
        }
        SyncEvent::CoinsUpdated => {
            tracing::debug!("{} coins known", coordinator.view().await.coins.len());
        }
        SyncEvent::CurrenciesUpdated => {
            tracing::debug!("{} currencies known", coordinator.view().await.currencies.len());
        }
        SyncEvent::RatesUpdated => {}
        SyncEvent::SourceAvailable => tracing::info!("CoinGecko reachable"),
        SyncEvent::Error { operation, error } => {
            tracing::warn!("{} failed: {}", operation, error);
        }
        SyncEvent::CacheWarning(error) => tracing::warn!("Cache: {}", error),
        SyncEvent::CacheStored { sync_date } => {
            tracing::debug!("Snapshot stored at {}", sync_date);
        }
    }
}
