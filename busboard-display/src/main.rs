//! Live bus arrivals for one stop, drawn on a small display.

mod frame;
mod monitor;
mod sink;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use tokio::{signal, sync::watch};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use busboard_core::config::MonitorConfig;
use busboard_provider_bods::BodsFeed;

use crate::monitor::MonitorLoop;
use crate::sink::TerminalSink;

/// Watch configured bus services approach one stop.
#[derive(Parser)]
#[command(name = "busboard", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "busboard.toml")]
    config: PathBuf,

    /// Run a single fetch/render cycle and exit (diagnostics)
    #[arg(long)]
    once: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "busboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // any failure from here to the loop entry exits non-zero
    let raw = fs::read_to_string(&cli.config)
        .with_context(|| format!("reading configuration from {}", cli.config.display()))?;
    let config: MonitorConfig =
        toml::from_str(&raw).context("parsing configuration")?;
    config.validate().context("invalid configuration")?;

    info!(
        stop = %config.stop.name,
        services = config.services.len(),
        poll_secs = config.poll_interval_secs,
        "configuration loaded"
    );

    let client = Client::builder()
        .user_agent(concat!("busboard/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("building HTTP client")?;

    let feed = Arc::new(BodsFeed::new(client, &config));
    let sink = Box::new(TerminalSink::new());
    let monitor = MonitorLoop::new(&config, feed, sink);

    if cli.once {
        monitor.run_once().await.context("initializing display")?;
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_tx.send(true);
            }
            Err(err) => warn!(error = %err, "could not listen for the shutdown signal"),
        }
    });

    monitor.run(shutdown_rx).await.context("initializing display")?;
    Ok(())
}
