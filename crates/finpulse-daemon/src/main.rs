//! Finpulse Daemon - simulated dashboard metrics with live anomaly reports
//!
//! The daemon:
//! - Evolves the dashboard metrics on a fixed tick
//! - Classifies the revenue series against its rolling baseline
//! - Logs each snapshot's anomaly report and operational pulse
//! - Traces the churn rate and logs its regime shifts and turn markers

use clap::Parser;
use finpulse_daemon::{shutdown_signal, Daemon, DaemonConfig, DaemonError, DaemonResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Finpulse Daemon CLI
#[derive(Parser)]
#[command(name = "finpulsed")]
#[command(about = "Finpulse Daemon - metrics simulation and anomaly detection", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FINPULSE_CONFIG")]
    config: Option<String>,

    /// Log level (overrides the config file; RUST_LOG wins over both)
    #[arg(long, env = "FINPULSE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "FINPULSE_LOG_JSON")]
    json: bool,

    /// Seconds between simulation ticks
    #[arg(short, long, env = "FINPULSE_TICK_INTERVAL")]
    tick_interval: Option<u64>,

    /// Fixed RNG seed for a reproducible run
    #[arg(long, env = "FINPULSE_SEED")]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())?;

    // Override with CLI args
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json {
        config.logging.json = true;
    }
    if let Some(secs) = cli.tick_interval {
        config.simulation.tick_interval_secs = secs;
    }
    if let Some(seed) = cli.seed {
        config.simulation.seed = Some(seed);
        config.churn.seed = Some(seed.wrapping_add(1));
    }

    // Initialize tracing
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|e| DaemonError::Logging(e.to_string()))?;

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| DaemonError::Logging(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| DaemonError::Logging(e.to_string()))?;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        tick_interval_secs = config.simulation.tick_interval_secs,
        churn_tick_interval_secs = config.churn.tick_interval_secs,
        seeded = config.simulation.seed.is_some(),
        "starting finpulsed"
    );

    let daemon = Daemon::new(config)?;
    daemon.run(shutdown_signal()).await
}
