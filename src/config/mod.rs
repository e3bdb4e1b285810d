//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! monitor.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//!     → split into per-subsystem sections at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AuthConfig, DatabaseConfig, LogFormat, MonitorConfig, ObservabilityConfig, RateLimitConfig,
    ServerConfig, SmtpConfig, SmtpTls, TargetConfig, TemplateConfig,
};
