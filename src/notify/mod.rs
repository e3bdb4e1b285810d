//! Notification subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     templates.rs loads alert/restored HTML once
//!
//! On transition (state lock held):
//!     AlertStateMachine builds a Notice
//!     → Notifier::notify
//!     → email.rs renders the template and sends over SMTP
//! ```
//!
//! # Design Decisions
//! - One attempt per notice; failures are reported, never retried
//! - Rendering happens per send so the timestamp is the send time

pub mod email;
pub mod templates;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use email::EmailNotifier;
pub use templates::{TemplateError, Templates};

/// Which edge a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Target became unreachable.
    Alert,
    /// Target is reachable again.
    Restored,
}

impl NotificationKind {
    pub fn subject(&self) -> &'static str {
        match self {
            NotificationKind::Alert => "Connection Alert",
            NotificationKind::Restored => "Connection Restored",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Alert => "alert",
            NotificationKind::Restored => "restored",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a notifier needs to announce one transition.
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NotificationKind,
    pub target: String,
    pub at: DateTime<Utc>,
}

/// Errors raised while delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid mailbox {address}: {source}")]
    Address {
        address: String,
        source: lettre::address::AddressError,
    },

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Dispatches human-facing notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &Notice) -> Result<(), NotifyError>;
}
