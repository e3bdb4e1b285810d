//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::MonitorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<MonitorConfig, ConfigError> {
    let config: MonitorConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MonitorConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[target]
address = "192.0.2.10:443"
interval_ms = 2500

[smtp]
host = "smtp.example.com"
sender = "monitor@example.com"
recipient = "ops@example.com"
tls = "tls"

[auth]
username = "admin"
password = "secret"
jwt_secret = "sign-me"
reset_token = "reset-me"

[observability]
log_format = "pretty"
"#;

    #[test]
    fn parses_minimal_file_with_defaults() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.target.address, "192.0.2.10:443");
        assert_eq!(config.target.interval_ms, 2500);
        assert_eq!(config.target.timeout_secs, 5);
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.tls, crate::config::SmtpTls::Tls);
        assert_eq!(config.auth.session_ttl_secs, 3600);
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.observability.log_format, crate::config::LogFormat::Pretty);
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.auth.reset_token, "reset-me");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/monitor.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn empty_file_fails_validation() {
        let err = parse_config("").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert!(!errors.is_empty()),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(parse_config("[target"), Err(ConfigError::Parse(_))));
    }
}
