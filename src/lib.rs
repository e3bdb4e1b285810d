//! Single-target reachability monitor with email alerts and an HTTP
//! control plane.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod notify;
pub mod observability;
pub mod security;
pub mod store;

pub use config::MonitorConfig;
pub use health::AlertStateMachine;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
