//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Bind the listener before any probe runs
//! - Run the monitor loop and the control plane until shutdown
//!
//! Any error before serving is fatal.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::MonitorConfig;
use crate::health::{AlertStateMachine, Monitor, TcpProbe};
use crate::http::{AppState, HttpServer, LoginCredentials};
use crate::lifecycle::Shutdown;
use crate::notify::{EmailNotifier, Notifier, NotifyError, TemplateError, Templates};
use crate::observability::metrics;
use crate::security::{AccessControl, JwtSessions};
use crate::store::{HistoryStore, SqliteStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("history store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("notifier setup failed: {0}")]
    Notifier(#[from] NotifyError),

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("metrics exporter failed: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("HTTP server failed: {0}")]
    Serve(std::io::Error),
}

/// Assemble handler state from configuration and the shared core.
pub fn app_state(
    config: &MonitorConfig,
    machine: Arc<AlertStateMachine>,
    store: Arc<dyn HistoryStore>,
) -> AppState {
    let sessions = JwtSessions::new(
        config.auth.jwt_secret.as_bytes(),
        Duration::from_secs(config.auth.session_ttl_secs),
    );

    AppState {
        machine,
        store,
        access: AccessControl::new(Arc::new(sessions), config.auth.reset_token.as_str()),
        credentials: Arc::new(LoginCredentials::new(
            config.auth.username.clone(),
            config.auth.password.clone(),
        )),
        static_dir: Arc::new(config.server.static_dir.clone()),
    }
}

/// Start everything and block until shutdown completes.
pub async fn run(config: MonitorConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let templates = Templates::load(&config.templates.alert_path, &config.templates.restored_path)?;
    tracing::info!("Email templates loaded");

    let store: Arc<dyn HistoryStore> = Arc::new(SqliteStore::open(&config.database.path)?);
    let seed = store.read_status()?;
    tracing::info!(
        path = %config.database.path.display(),
        persisted_state = seed.as_ref().map_or("none", |s| s.state.as_str()),
        "History store opened"
    );

    let notifier: Arc<dyn Notifier> = Arc::new(EmailNotifier::new(&config.smtp, templates)?);
    let machine = Arc::new(AlertStateMachine::new(
        config.target.address.clone(),
        notifier,
        store.clone(),
        seed,
    ));

    let listener = TcpListener::bind(&config.server.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.server.bind_address.clone(),
            source,
        })?;

    let probe = Arc::new(TcpProbe::new(
        config.target.address.clone(),
        Duration::from_secs(config.target.timeout_secs),
    ));
    let monitor = Monitor::new(
        probe,
        machine.clone(),
        store.clone(),
        Duration::from_millis(config.target.interval_ms),
    );
    let monitor_task = tokio::spawn(monitor.run(shutdown.subscribe()));

    let server = HttpServer::new(
        app_state(&config, machine, store),
        &config.server,
        &config.rate_limit,
    );
    let served = server.run(listener, shutdown.subscribe()).await;

    // Stop the monitor even if the server died on its own.
    shutdown.trigger();
    if let Err(e) = monitor_task.await {
        tracing::error!(error = %e, "Monitor task panicked");
    }

    served.map_err(StartupError::Serve)
}
