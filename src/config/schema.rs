//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Control-plane listener settings.
    pub server: ServerConfig,

    /// The single monitored target.
    pub target: TargetConfig,

    /// Outgoing mail settings.
    pub smtp: SmtpConfig,

    /// Email template locations.
    pub templates: TemplateConfig,

    /// History database settings.
    pub database: DatabaseConfig,

    /// Login credentials, session signing and the reset token.
    pub auth: AuthConfig,

    /// Rate limiting thresholds.
    pub rate_limit: RateLimitConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP control-plane configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Directory holding `index.html`, `login.html` and other assets.
    pub static_dir: PathBuf,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            static_dir: PathBuf::from("static"),
            request_timeout_secs: 30,
        }
    }
}

/// Monitored target configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Target address as `host:port`.
    pub address: String,

    /// Connect timeout for a single probe, in seconds.
    pub timeout_secs: u64,

    /// Pause between probe cycles, in milliseconds.
    pub interval_ms: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            timeout_secs: 5,
            interval_ms: 10_000,
        }
    }
}

/// Transport security used when talking to the SMTP relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    /// Plain connection upgraded with STARTTLS.
    #[default]
    Starttls,
    /// Implicit TLS (usually port 465).
    Tls,
    /// No encryption. Local relays and tests only.
    None,
}

/// SMTP configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// `From` address.
    pub sender: String,
    /// Single `To` address.
    pub recipient: String,
    pub tls: SmtpTls,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            sender: String::new(),
            recipient: String::new(),
            tls: SmtpTls::Starttls,
        }
    }
}

/// Email template files, read once at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub alert_path: PathBuf,
    pub restored_path: PathBuf,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            alert_path: PathBuf::from("email/email_alert.html"),
            restored_path: PathBuf::from("email/email_restored.html"),
        }
    }
}

/// History database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("logs.db"),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Dashboard login name.
    pub username: String,

    /// Dashboard login password.
    pub password: String,

    /// HMAC secret used to sign session tokens.
    pub jwt_secret: String,

    /// Session lifetime in seconds.
    pub session_ttl_secs: u64,

    /// Shared secret expected in the `Authorization` header of `/reset-alert`.
    pub reset_token: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            jwt_secret: String::new(),
            session_ttl_secs: 3600,
            reset_token: String::new(),
        }
    }
}

/// Rate limiting configuration.
///
/// Buckets are process-wide: one for the read API, one for `/reset-alert`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Tokens refilled per second on `/status` and `/logs`.
    pub api_per_second: u32,

    /// Burst capacity of the API bucket.
    pub api_burst: u32,

    /// Tokens refilled per minute on `/reset-alert`.
    pub reset_per_minute: u32,

    /// Burst capacity of the reset bucket.
    pub reset_burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            api_per_second: 10,
            api_burst: 20,
            reset_per_minute: 5,
            reset_burst: 5,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
