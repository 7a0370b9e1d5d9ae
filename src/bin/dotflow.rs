//! Dotflow Binary - Sentiment Convergence Processor
//!
//! Dispatches among the three engine modes:
//!
//! ```bash
//! cargo run --release --bin dotflow -- backfill
//! cargo run --release --bin dotflow -- live
//! cargo run --release --bin dotflow -- validate
//! ```
//!
//! ## Environment Variables
//!
//! - DOTFLOW_DB_PATH - SQLite database path (default: data/dotflow.db)
//! - DOT_VERSION - Aggregator version, v1 or v2 (default: v1)
//! - LABEL_ANALYST - Sentiment analyst version for the label tables (default: v3)
//! - BACKFILL_HORIZON_SECS - Backfill stops this far behind now (default: 1800)
//! - CATCHUP_THRESHOLD_SECS - Gap that triggers backfill at live startup (default: 1800)
//! - RUST_LOG - Logging level (optional, default: info)

use dotflow::config::Config;
use dotflow::dot_core::{BackfillRunner, LiveProcessor, Validator};
use dotflow::store::{IntervalTicker, SqliteDotStore, SqliteLabelStore, SystemClock};
use std::env;
use std::time::Duration;

fn usage() -> ! {
    eprintln!("usage: dotflow <backfill | live | validate>");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let mode = match env::args().nth(1) {
        Some(mode) => mode,
        None => usage(),
    };

    let config = Config::from_env()?;

    log::info!("🚀 Starting dotflow ({})", mode);
    log::info!("   Database: {}", config.db_path);
    log::info!("   Dot version: {}", config.version);
    log::info!("   Label analyst: {}", config.label_analyst);

    let labels = SqliteLabelStore::open(&config.db_path)?;
    let dots = SqliteDotStore::open(&config.db_path)?;
    let clock = SystemClock;

    match mode.as_str() {
        "backfill" => {
            let runner = BackfillRunner::new(
                &labels,
                &dots,
                &clock,
                config.version,
                config.label_analyst.clone(),
                config.backfill_horizon_secs,
            );
            let summary = runner.run()?;
            log::info!(
                "done: {} inserted, {} skipped",
                summary.inserted,
                summary.skipped
            );
        }
        "live" => {
            let processor = LiveProcessor::new(
                &labels,
                &dots,
                &clock,
                config.version,
                config.label_analyst.clone(),
                config.catchup_threshold_secs,
                config.backfill_horizon_secs,
            );
            let period = config.version.new_empty().period_secs();
            let mut ticker = IntervalTicker::new(Duration::from_secs(period as u64));
            processor.run(&mut ticker).await?;
        }
        "validate" => {
            let validator = Validator::new(&dots, config.version);
            let report = validator.validate()?;
            log::info!("series is contiguous: {} records", report.records);
        }
        _ => usage(),
    }

    Ok(())
}
