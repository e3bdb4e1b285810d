//! Structured logging.
//!
//! `RUST_LOG` wins over the configured level when set. JSON lines are the
//! default; `pretty` is meant for a terminal.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Build the filter directive for a configured level.
pub fn filter_directive(level: &str) -> String {
    format!("uplink_monitor={level},tower_http={level}")
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter_directive(&config.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
