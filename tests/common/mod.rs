//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;

use uplink_monitor::config::MonitorConfig;
use uplink_monitor::health::{AlertStateMachine, Probe, ProbeOutcome};
use uplink_monitor::http::HttpServer;
use uplink_monitor::lifecycle::startup::app_state;
use uplink_monitor::lifecycle::Shutdown;
use uplink_monitor::notify::{NotificationKind, Notice, Notifier, NotifyError};
use uplink_monitor::store::SqliteStore;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "correct horse";
pub const JWT_SECRET: &str = "integration-signing-secret";
pub const RESET_TOKEN: &str = "integration-reset-token";

/// Start a TCP target that accepts and immediately closes connections.
pub async fn start_mock_target() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });

    addr
}

/// Notifier that remembers what it was asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<NotificationKind>>,
}

impl RecordingNotifier {
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notice: &Notice) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notice.kind);
        Ok(())
    }
}

/// Probe that replays a script, then hangs forever.
pub struct ScriptedProbe {
    outcomes: Mutex<VecDeque<ProbeOutcome>>,
}

impl ScriptedProbe {
    pub fn new(outcomes: impl IntoIterator<Item = ProbeOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
        }
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    fn target(&self) -> &str {
        "scripted:9"
    }

    async fn probe(&self) -> ProbeOutcome {
        let next = self.outcomes.lock().unwrap().pop_front();
        match next {
            Some(outcome) => outcome,
            None => std::future::pending().await,
        }
    }
}

/// Configuration with every credential filled in.
pub fn test_config() -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.target.address = "scripted:9".into();
    config.target.interval_ms = 10;
    config.smtp.sender = "monitor@example.com".into();
    config.smtp.recipient = "ops@example.com".into();
    config.auth.username = USERNAME.into();
    config.auth.password = PASSWORD.into();
    config.auth.jwt_secret = JWT_SECRET.into();
    config.auth.reset_token = RESET_TOKEN.into();
    config.rate_limit.api_per_second = 1000;
    config.rate_limit.api_burst = 1000;
    config.rate_limit.reset_per_minute = 1000;
    config.rate_limit.reset_burst = 1000;
    config
}

/// A running control plane over an in-memory store.
pub struct TestServer {
    pub addr: SocketAddr,
    pub machine: Arc<AlertStateMachine>,
    pub store: Arc<SqliteStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
    _static_dir: tempfile::TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(customize: impl FnOnce(&mut MonitorConfig)) -> Self {
        let static_dir = tempfile::tempdir().unwrap();
        std::fs::write(static_dir.path().join("index.html"), "<h1>dashboard</h1>").unwrap();
        std::fs::write(static_dir.path().join("login.html"), "<form>login</form>").unwrap();

        let mut config = test_config();
        config.server.static_dir = static_dir.path().to_path_buf();
        customize(&mut config);

        let notifier = Arc::new(RecordingNotifier::default());
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let machine = Arc::new(AlertStateMachine::new(
            config.target.address.clone(),
            notifier.clone(),
            store.clone(),
            None,
        ));

        let state = app_state(&config, machine.clone(), store.clone());
        let server = HttpServer::new(state, &config.server, &config.rate_limit);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        Self {
            addr,
            machine,
            store,
            notifier,
            shutdown,
            client,
            _static_dir: static_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Log in with the configured credentials and return the `Cookie` value.
    pub async fn login(&self) -> String {
        let res = self
            .client
            .post(self.url("/login"))
            .form(&[("username", USERNAME), ("password", PASSWORD)])
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 303);

        res.headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| pair.starts_with("token="))
            .expect("login should set the token cookie")
            .to_string()
    }

    pub async fn get_with_cookie(&self, path: &str, cookie: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header(reqwest::header::COOKIE, cookie)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Poll until `check` holds or the deadline passes.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
