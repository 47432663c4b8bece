//! Health Alerter
//!
//! Watches a model server's request counters and raises an alert when it
//! stops serving successfully.
//!
//! # Architecture Overview
//!
//! ```text
//!   metrics endpoint            ┌──────────────────────── ALERTER ────────────────────────┐
//!   (success / total) ──scrape──┼─▶ source ─▶ evaluator ─▶ state machine ─▶ notify ──────┼──▶ webhook / log
//!                               │                │                                        │
//!                               │                └──▶ status snapshot ◀── status API ◀────┼─── operators
//!                               │                                                         │
//!                               │   config · observability · resilience · lifecycle       │
//!                               └─────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use clap::Parser;

use health_alerter::config::load_config;
use health_alerter::lifecycle;
use health_alerter::observability::init_logging;

#[derive(Parser)]
#[command(name = "health-alerter", version)]
#[command(about = "Alerts when a model server stops serving successfully", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "alerter.toml")]
    config: PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let env: HashMap<String, String> = std::env::vars().collect();

    // Logging is configured from the file, so load errors go to stderr.
    let config = match load_config(&args.config, &env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", args.config.display(), e);
            return ExitCode::from(2);
        }
    };

    if args.check {
        println!("{}: configuration OK ({} alerts)", args.config.display(), config.effective_alerts().len());
        return ExitCode::SUCCESS;
    }

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("failed to initialize logging: {}", e);
        return ExitCode::from(2);
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        source = %config.source.url,
        tick_interval = ?config.evaluator.tick_interval,
        threshold_low = config.thresholds.threshold_low,
        "health-alerter starting"
    );

    match lifecycle::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Alerter failed");
            ExitCode::FAILURE
        }
    }
}
