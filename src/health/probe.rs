//! Reachability probe.
//!
//! # Responsibilities
//! - Perform one connectivity check against the monitored target
//! - Collapse every kind of failure (refused, DNS, timeout) into `Failure`

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::time;

/// Result of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeOutcome {
    Success,
    Failure,
}

impl ProbeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeOutcome::Success => "success",
            ProbeOutcome::Failure => "failure",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(ProbeOutcome::Success),
            "failure" => Some(ProbeOutcome::Failure),
            _ => None,
        }
    }
}

impl From<bool> for ProbeOutcome {
    fn from(reachable: bool) -> Self {
        if reachable {
            ProbeOutcome::Success
        } else {
            ProbeOutcome::Failure
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reachability check against one fixed target.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Human-readable target, used in logs and notification bodies.
    fn target(&self) -> &str;

    /// Run one check.
    async fn probe(&self) -> ProbeOutcome;
}

/// Probes a target by opening (and immediately dropping) a TCP connection.
pub struct TcpProbe {
    address: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    fn target(&self) -> &str {
        &self.address
    }

    async fn probe(&self) -> ProbeOutcome {
        match time::timeout(self.timeout, TcpStream::connect(&self.address)).await {
            Ok(Ok(_stream)) => ProbeOutcome::Success,
            Ok(Err(e)) => {
                tracing::warn!(target_addr = %self.address, error = %e, "Probe failed: connection error");
                ProbeOutcome::Failure
            }
            Err(_) => {
                tracing::warn!(target_addr = %self.address, timeout = ?self.timeout, "Probe failed: timeout");
                ProbeOutcome::Failure
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn reachable_listener_is_success() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let probe = TcpProbe::new(addr.to_string(), Duration::from_secs(1));
        assert_eq!(probe.probe().await, ProbeOutcome::Success);
    }

    #[tokio::test]
    async fn closed_port_is_failure() {
        // Bind then drop to get a port nobody listens on.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let probe = TcpProbe::new(addr.to_string(), Duration::from_secs(1));
        assert_eq!(probe.probe().await, ProbeOutcome::Failure);
    }

    #[tokio::test]
    async fn unresolvable_host_is_failure() {
        let probe = TcpProbe::new("host.invalid:80", Duration::from_secs(2));
        assert_eq!(probe.probe().await, ProbeOutcome::Failure);
    }

    #[test]
    fn outcome_strings_round_trip() {
        assert_eq!(ProbeOutcome::parse("success"), Some(ProbeOutcome::Success));
        assert_eq!(ProbeOutcome::parse(ProbeOutcome::Failure.as_str()), Some(ProbeOutcome::Failure));
        assert_eq!(ProbeOutcome::parse("up"), None);
    }
}
