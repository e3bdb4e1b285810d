//! Health monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! Active monitor (active.rs):
//!     Sleep for the configured interval
//!     → probe.rs (TCP connect to the target)
//!     → state.rs (compare, notify, persist status; lock held)
//!     → append ProbeRecord to the history store
//!
//! HTTP handlers:
//!     → state.rs snapshot / reset_alert (same lock)
//! ```
//!
//! # Design Decisions
//! - A single fixed target; no backoff, jitter or retry cutoff
//! - Probe errors and timeouts are plain failures
//! - All coordination goes through the state machine's lock

pub mod active;
pub mod probe;
pub mod state;

pub use active::Monitor;
pub use probe::{Probe, ProbeOutcome, TcpProbe};
pub use state::{AlertStateMachine, ConnectionState, StatusSnapshot, TransitionResult};
