//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Read API (/status, /logs):
//!     → access_control.rs (session cookie, 401 on failure)
//!     → rate_limit.rs (shared per-second bucket)
//!
//! Reset (/reset-alert):
//!     → rate_limit.rs (shared per-minute bucket, silent drop)
//!     → access_control.rs (static token)
//!
//! Browser pages (/, /login):
//!     → access_control.rs (redirects)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any verification failure
//! - Session tokens are stateless; nothing is stored server-side
//! - Auth failures are warnings, never errors

pub mod access_control;
pub mod headers;
pub mod rate_limit;
pub mod session;

pub use access_control::AccessControl;
pub use rate_limit::{DenyPolicy, RateLimiter};
pub use session::{AuthError, JwtSessions, SessionClaim, SessionCodec, SESSION_COOKIE};
