//! Uplink monitor daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌───────────────────────────────────────────────────────┐
//!                 │                    UPLINK MONITOR                      │
//!                 │                                                        │
//!                 │  ┌──────────┐   ┌──────────────────┐   ┌───────────┐   │
//!   Target ◀──────┼──│  probe   │◀──│  monitor loop    │──▶│  history  │   │
//!   host:port     │  │  (TCP)   │   │  (background)    │   │  (SQLite) │   │
//!                 │  └──────────┘   └────────┬─────────┘   └─────▲─────┘   │
//!                 │                          │ observe            │         │
//!                 │                          ▼                    │         │
//!                 │               ┌──────────────────────┐        │         │
//!                 │               │  AlertStateMachine   │────────┤         │
//!   Operator ◀────┼── SMTP ◀──────│  (single lock)       │        │         │
//!                 │               └──────────▲───────────┘        │         │
//!                 │                          │ snapshot/reset     │ read    │
//!                 │  ┌──────────────────────────────────────────────────┐  │
//!   Browser/CLI ──┼─▶│ control plane: access control → rate limit →     │  │
//!                 │  │ /status /logs /reset-alert /login /              │  │
//!                 │  └──────────────────────────────────────────────────┘  │
//!                 └───────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use uplink_monitor::config::{load_config, ObservabilityConfig};
use uplink_monitor::lifecycle::{signals, startup, Shutdown};
use uplink_monitor::observability::logging;

#[derive(Parser)]
#[command(name = "uplink-monitor")]
#[command(about = "Probes one host, emails on state changes, serves status over HTTP", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "monitor.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            logging::init(&ObservabilityConfig::default());
            tracing::error!(path = %args.config.display(), error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "uplink-monitor starting");
    tracing::info!(
        target_addr = %config.target.address,
        interval_ms = config.target.interval_ms,
        bind_address = %config.server.bind_address,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_termination().await;
        trigger.trigger();
    });

    if let Err(e) = startup::run(config, shutdown).await {
        tracing::error!(error = %e, "Fatal error");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
