// src/main.rs

//! tcgwatch: TCGplayer card-listing monitor CLI

use clap::{Parser, Subcommand};

use tcgwatch::error::Result;
use tcgwatch::models::Config;
use tcgwatch::pipeline::{run_seed_all, run_tick, run_watch};
use tcgwatch::services::{DiscordNotifier, HttpPageFetcher, Notifier, NullNotifier};
use tcgwatch::storage::LocalStore;

#[derive(Parser, Debug)]
#[command(
    name = "tcgwatch",
    version = "0.1.0",
    about = "Monitors card listings for new sales, price drops and threshold breaches"
)]

/// CLI Arguments
struct Cli {
    #[arg(short, long, default_value = "data/config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

/// CLI Commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Run the periodic monitoring loop
    Watch,
    /// Run a single monitoring pass over all products
    Cycle,
    /// Capture baselines without sending notifications
    Seed,
    /// Validate the configuration file
    Validate,
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.logging.level),
    )
    .init();

    config.validate()?;

    if matches!(cli.command, Command::Validate) {
        log::info!(
            "Configuration OK: {} product(s), thresholds ${:.2} / {}",
            config.products.len(),
            config.thresholds.max_price_alert,
            config.thresholds.min_condition
        );
        return Ok(());
    }

    let fetcher = HttpPageFetcher::new(
        &config.scraper,
        config.selectors.clone(),
        config.monitor.request_delay_ms,
    )?;
    let store = LocalStore::new(&config.storage.data_dir);

    let notifier: Box<dyn Notifier> = if config.alerts.discord_webhook_url.is_empty() {
        log::info!("No webhook configured; alerts will only be logged");
        Box::new(NullNotifier)
    } else {
        Box::new(DiscordNotifier::new(
            config.alerts.discord_webhook_url.clone(),
            config.alerts.username.clone(),
        ))
    };

    match cli.command {
        Command::Watch => run_watch(&config, &fetcher, &store, notifier.as_ref()).await?,
        Command::Cycle => run_tick(&config, &fetcher, &store, notifier.as_ref()).await,
        Command::Seed => run_seed_all(&config, &fetcher, &store).await?,
        Command::Validate => unreachable!(),
    }

    Ok(())
}
