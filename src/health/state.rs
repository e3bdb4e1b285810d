//! Connection status state machine.
//!
//! # States
//! - Unknown: no probe has completed yet (and nothing was persisted)
//! - Healthy: last probe reached the target
//! - Failed: last probe did not reach the target
//!
//! # State Transitions
//! ```text
//! Unknown|Healthy → Failed : failed probe            (alert)
//! Failed → Healthy         : successful probe        (restored)
//! Unknown → Healthy        : successful probe        (silent)
//! Failed → Failed          : failed probe            (alert only if reset since)
//! Healthy → Healthy        : successful probe        (silent)
//! ```
//!
//! # Design Decisions
//! - One async mutex guards state, the alert flag and the last-notified
//!   timestamp; it is held across the notifier call and the status write
//! - A failed send still commits the new state but leaves the timestamp
//!   untouched, and is not retried
//! - `reset_alert` clears the alert flag only, never the state

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::health::probe::ProbeOutcome;
use crate::notify::{NotificationKind, Notice, Notifier};
use crate::observability::metrics;
use crate::store::{HistoryStore, StatusRecord};

/// Health of the monitored target as last committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unknown,
    Healthy,
    Failed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Unknown => "unknown",
            ConnectionState::Healthy => "healthy",
            ConnectionState::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unknown" => Some(ConnectionState::Unknown),
            "healthy" => Some(ConnectionState::Healthy),
            "failed" => Some(ConnectionState::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A consistent copy of the guarded status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub state: ConnectionState,
    /// Whether an alert has been dispatched for the current failure.
    pub alert_sent: bool,
    pub last_notified_at: Option<DateTime<Utc>>,
}

/// What one observed probe did to the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub previous: ConnectionState,
    pub state: ConnectionState,
    /// Notification attempted for this probe, if any.
    pub dispatched: Option<NotificationKind>,
    /// The attempted notification was accepted by the notifier.
    pub delivered: bool,
}

impl TransitionResult {
    pub fn did_notify(&self) -> bool {
        self.dispatched.is_some()
    }

    pub fn changed(&self) -> bool {
        self.previous != self.state
    }
}

struct Status {
    state: ConnectionState,
    alert_sent: bool,
    last_notified_at: Option<DateTime<Utc>>,
}

impl Status {
    fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state,
            alert_sent: self.alert_sent,
            last_notified_at: self.last_notified_at,
        }
    }

    fn record(&self) -> StatusRecord {
        StatusRecord {
            state: self.state,
            last_notified_at: self.last_notified_at,
        }
    }
}

/// Owner of the process-wide connection status.
///
/// Shared by handle between the monitor loop and every HTTP handler; the
/// raw fields are reachable only through `observe_probe`, `reset_alert`
/// and `snapshot`.
pub struct AlertStateMachine {
    status: Mutex<Status>,
    target: String,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn HistoryStore>,
}

impl AlertStateMachine {
    /// Build the machine, seeded from a persisted status when one exists.
    ///
    /// A persisted `Failed` state counts as already alerted so a restart
    /// does not repeat the alert.
    pub fn new(
        target: impl Into<String>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn HistoryStore>,
        seed: Option<StatusRecord>,
    ) -> Self {
        let status = match seed {
            Some(record) => Status {
                state: record.state,
                alert_sent: record.state == ConnectionState::Failed,
                last_notified_at: record.last_notified_at,
            },
            None => Status {
                state: ConnectionState::Unknown,
                alert_sent: false,
                last_notified_at: None,
            },
        };
        metrics::record_connection_state(status.state);

        Self {
            status: Mutex::new(status),
            target: target.into(),
            notifier,
            store,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Feed one probe outcome through the state machine.
    ///
    /// State comparison, notification and the status write all happen
    /// under the lock, so no reader sees a flipped state whose
    /// notification has not been attempted.
    pub async fn observe_probe(&self, outcome: ProbeOutcome) -> TransitionResult {
        let mut status = self.status.lock().await;
        let previous = status.state;

        let (next, dispatch) = match (outcome, previous) {
            (ProbeOutcome::Failure, ConnectionState::Failed) if status.alert_sent => {
                (ConnectionState::Failed, None)
            }
            (ProbeOutcome::Failure, _) => (ConnectionState::Failed, Some(NotificationKind::Alert)),
            (ProbeOutcome::Success, ConnectionState::Failed) => {
                (ConnectionState::Healthy, Some(NotificationKind::Restored))
            }
            (ProbeOutcome::Success, _) => (ConnectionState::Healthy, None),
        };

        status.state = next;
        if previous != next {
            tracing::info!(from = %previous, to = %next, target_addr = %self.target, "Connection state changed");
            metrics::record_connection_state(next);
        }

        let mut delivered = false;
        if let Some(kind) = dispatch {
            let notice = Notice {
                kind,
                target: self.target.clone(),
                at: Utc::now(),
            };
            match self.notifier.notify(&notice).await {
                Ok(()) => {
                    status.last_notified_at = Some(notice.at);
                    delivered = true;
                }
                Err(e) => {
                    tracing::error!(kind = %kind, error = %e, "Failed to send notification");
                }
            }
            metrics::record_notification(kind, delivered);
            status.alert_sent = kind == NotificationKind::Alert;
        }

        if previous != next || delivered {
            let store = self.store.clone();
            let record = status.record();
            match tokio::task::spawn_blocking(move || store.write_status(&record)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "Failed to persist connection status"),
                Err(e) => tracing::error!(error = %e, "Status write task failed"),
            }
        }

        TransitionResult {
            previous,
            state: next,
            dispatched: dispatch,
            delivered,
        }
    }

    /// Clear the "alert sent" flag so the next failed probe alerts again.
    ///
    /// Returns the flag's previous value. The connection state is untouched.
    pub async fn reset_alert(&self) -> bool {
        let mut status = self.status.lock().await;
        std::mem::replace(&mut status.alert_sent, false)
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        self.status.lock().await.snapshot()
    }
}
