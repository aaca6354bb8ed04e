//! pricewatch - Entry Point
//!
//! Polls a watchlist during extended market hours and pushes alerts when
//! percent-change or price-target rules fire.

use anyhow::Result;
use clap::Parser;
use pricewatch_bot::{AppConfig, Application, ConfigSource, DEFAULT_CONFIG_PATH};
use tracing::{info, warn};

/// Stock price alert monitor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PRICEWATCH_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,

    /// Send a test notification and exit
    #[arg(long)]
    testpush: bool,

    /// Report how many alerts each threshold would have produced over the
    /// analysis window, then exit
    #[arg(long)]
    analyze: bool,

    /// Append market data requests and responses to the API log
    #[arg(long)]
    apilog: bool,

    /// Run a single polling cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, source) = AppConfig::load(args.config.as_deref())?;
    if args.once {
        config.polling.run_once = true;
    }

    let directive = if args.verbose {
        "debug".to_string()
    } else {
        config.telemetry.log_level.clone()
    };
    pricewatch_telemetry::init_logging(&directive)?;

    info!("Starting pricewatch v{}", env!("CARGO_PKG_VERSION"));
    match &source {
        ConfigSource::File(path) => info!(path = %path, "Config file loaded"),
        ConfigSource::Defaults => {
            warn!(path = DEFAULT_CONFIG_PATH, "Config file not found, using defaults")
        }
    }
    info!(
        watchlist = %config.watchlist_path,
        timezone = %config.market.timezone,
        interval_secs = config.polling.interval_secs,
        "Configuration loaded"
    );

    let app = Application::new(config, args.apilog)?;

    if args.testpush {
        app.send_test_notification().await?;
        return Ok(());
    }

    if args.analyze {
        for (ticker, result) in app.analyze().await {
            println!("--- {ticker} ---");
            match result {
                Ok(counts) if counts.is_empty() => println!("Not enough data to analyze."),
                Ok(counts) => {
                    for c in counts {
                        println!(
                            "Alerts in the analysis window at {}% threshold: {}",
                            c.threshold.normalize(),
                            c.alerts
                        );
                    }
                }
                Err(e) => println!("Could not fetch history: {e}"),
            }
        }
        return Ok(());
    }

    app.run().await?;

    Ok(())
}
