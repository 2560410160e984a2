use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use eyre::{Error, Result};
use log::{info, warn};
use tokio::sync::watch;
use trine::config::Config;
use trine::market::{BybitClient, MarketDataProvider, StaticMarket, Throttled};
use trine::notify::{Alerts, LogNotifier, Notifier, TelegramNotifier};
use trine::scanner::Scanner;
use trine::utils::logger::setup_logger;
use trine::utils::rate_limit::RateLimiter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan continuously until Ctrl-C (default)
    Scan,
    /// Run a single cycle and exit
    Once,
    /// Print the route set and exit
    Routes,
    /// Run one cycle against a recorded market file
    Replay { path: PathBuf },
    /// Send a test alert
    Notify { message: String },
}

/// Live exchange client behind the shared rate limiter
fn live_market(config: &Config) -> Result<Arc<dyn MarketDataProvider>> {
    let client = BybitClient::new(
        config.exchange_url.clone(),
        config.request_timeout,
        config.book_depth,
        config.credentials.clone(),
    )?;
    let limiter = Arc::new(RateLimiter::new(config.request_delay));
    Ok(Arc::new(Throttled::new(client, limiter)))
}

/// Telegram when configured, the log otherwise
fn alerts(config: &Config) -> Result<Alerts> {
    let notifier: Box<dyn Notifier> = match &config.telegram {
        Some(settings) => Box::new(TelegramNotifier::new(settings.clone())?),
        None => {
            info!("No Telegram credentials, alerts go to the log");
            Box::new(LogNotifier)
        }
    };
    Ok(Alerts::new(notifier, &config.alert_blacklist))
}

/// Shutdown flag raised on Ctrl-C
fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal, finishing current routes...");
                let _ = tx.send(true);
            }
            Err(e) => warn!("Cannot listen for Ctrl-C: {e}"),
        }
    });
    rx
}

async fn scan(config: Arc<Config>) -> Result<(), Error> {
    let market = live_market(&config)?;
    let alerts = alerts(&config)?;
    let mut scanner = Scanner::new(config, market, alerts).with_progress(true);
    scanner.run(shutdown_on_ctrl_c()).await
}

async fn once(config: Arc<Config>, market: Arc<dyn MarketDataProvider>) -> Result<(), Error> {
    let alerts = alerts(&config)?;
    let mut scanner = Scanner::new(config, market, alerts).with_progress(true);
    scanner.refresh().await?;
    let report = scanner.run_cycle(&shutdown_on_ctrl_c()).await;
    println!("{report}");
    Ok(())
}

async fn print_routes(config: Arc<Config>) -> Result<(), Error> {
    let market = live_market(&config)?;
    let mut scanner = Scanner::new(config, market, Alerts::new(Box::new(LogNotifier), Vec::<String>::new()));
    scanner.refresh().await?;
    for (i, route) in scanner.routes().iter().enumerate() {
        println!("{i:>5}  {route}");
    }
    println!("\nFound {} routes", scanner.routes().len());
    Ok(())
}

async fn replay(config: Arc<Config>, path: &Path) -> Result<(), Error> {
    let market = StaticMarket::load(path)?;
    once(config, Arc::new(market)).await
}

async fn send_test_alert(config: &Config, message: &str) -> Result<(), Error> {
    if alerts(config)?.raw(message).await {
        println!("Alert sent");
    } else {
        println!("Alert not delivered, see log");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    setup_logger()?;

    let cli = Cli::parse();
    let config = Arc::new(Config::from_env()?);

    match cli.command {
        Some(Commands::Once) => {
            let market = live_market(&config)?;
            once(config, market).await?;
        }
        Some(Commands::Routes) => print_routes(config).await?,
        Some(Commands::Replay { path }) => replay(config, &path).await?,
        Some(Commands::Notify { message }) => send_test_alert(&config, &message).await?,
        Some(Commands::Scan) | None => scan(config).await?,
    }

    Ok(())
}
