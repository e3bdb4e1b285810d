//! Configuration validation.
//!
//! Serde handles syntax; this checks the values a running monitor cannot do
//! without. All failures are collected so an operator sees them at once.

use std::fmt;

use crate::config::schema::MonitorConfig;

/// Longest session a login may grant: one year.
pub const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending key, e.g. `target.address`.
    pub field: &'static str,
    pub message: &'static str,
}

impl ValidationError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than zero"));
    }

    if config.target.address.trim().is_empty() {
        errors.push(ValidationError::new("target.address", "must not be empty"));
    } else if !config.target.address.contains(':') {
        errors.push(ValidationError::new("target.address", "must be host:port"));
    }
    if config.target.interval_ms == 0 {
        errors.push(ValidationError::new("target.interval_ms", "must be greater than zero"));
    }
    if config.target.timeout_secs == 0 {
        errors.push(ValidationError::new("target.timeout_secs", "must be greater than zero"));
    }

    if config.smtp.sender.is_empty() {
        errors.push(ValidationError::new("smtp.sender", "must not be empty"));
    }
    if config.smtp.recipient.is_empty() {
        errors.push(ValidationError::new("smtp.recipient", "must not be empty"));
    }

    if config.auth.username.is_empty() || config.auth.password.is_empty() {
        errors.push(ValidationError::new("auth.username", "login credentials must be set"));
    }
    if config.auth.jwt_secret.is_empty() {
        errors.push(ValidationError::new("auth.jwt_secret", "must not be empty"));
    }
    if config.auth.reset_token.is_empty() {
        errors.push(ValidationError::new("auth.reset_token", "must not be empty"));
    }
    if config.auth.session_ttl_secs == 0 {
        errors.push(ValidationError::new("auth.session_ttl_secs", "must be greater than zero"));
    } else if config.auth.session_ttl_secs > MAX_SESSION_TTL_SECS {
        errors.push(ValidationError::new("auth.session_ttl_secs", "must be at most one year"));
    }

    let limits = &config.rate_limit;
    if limits.api_per_second == 0 || limits.api_burst == 0 {
        errors.push(ValidationError::new("rate_limit.api_per_second", "api bucket needs a non-zero rate and burst"));
    }
    if limits.reset_per_minute == 0 || limits.reset_burst == 0 {
        errors.push(ValidationError::new("rate_limit.reset_per_minute", "reset bucket needs a non-zero rate and burst"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> MonitorConfig {
        let mut config = MonitorConfig::default();
        config.target.address = "10.0.0.1:22".into();
        config.smtp.sender = "monitor@example.com".into();
        config.smtp.recipient = "ops@example.com".into();
        config.auth.username = "admin".into();
        config.auth.password = "hunter2".into();
        config.auth.jwt_secret = "signing-secret".into();
        config.auth.reset_token = "reset-secret".into();
        config
    }

    #[test]
    fn accepts_complete_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let mut config = valid();
        config.target.address = String::new();
        config.target.interval_ms = 0;
        config.auth.reset_token = String::new();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["target.address", "target.interval_ms", "auth.reset_token"]);
    }

    #[test]
    fn rejects_address_without_port() {
        let mut config = valid();
        config.target.address = "10.0.0.1".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].message, "must be host:port");
    }

    #[test]
    fn rejects_zero_request_timeout() {
        let mut config = valid();
        config.server.request_timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::new("server.request_timeout_secs", "must be greater than zero")]);
    }

    #[test]
    fn session_ttl_is_capped_at_a_year() {
        let mut config = valid();
        config.auth.session_ttl_secs = MAX_SESSION_TTL_SECS;
        assert!(validate_config(&config).is_ok());

        config.auth.session_ttl_secs = u64::MAX;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "auth.session_ttl_secs");
        assert_eq!(errors[0].message, "must be at most one year");
    }
}
