//! HTTP control plane.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, tracing, timeout)
//!     → security (session / static token, rate limit; per route group)
//!     → handlers.rs (status, logs, reset, login, pages)
//!     → AlertStateMachine (snapshot / reset) or HistoryStore (read)
//!     → JSON or HTML response
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, LoginCredentials};
