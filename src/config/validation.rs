//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parseable)
//! - Check timer ordering (safety net must outlast the fallback)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EngineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::EngineConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "timeouts.fallback_delay_ms").
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(err(
            "listener.bind_address",
            format!("not a valid socket address: {}", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(err("listener.max_connections", "must be greater than zero"));
    }

    if config.timeouts.fallback_delay_ms == 0 {
        errors.push(err("timeouts.fallback_delay_ms", "must be greater than zero"));
    }
    if config.timeouts.response_timeout_ms == 0 {
        errors.push(err("timeouts.response_timeout_ms", "must be greater than zero"));
    }
    // The per-response safety net is the last line of defense; it has to
    // fire after the global fallback has had its chance.
    if config.timeouts.response_timeout_ms <= config.timeouts.fallback_delay_ms {
        errors.push(err(
            "timeouts.response_timeout_ms",
            "must be greater than timeouts.fallback_delay_ms",
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(err("timeouts.request_secs", "must be greater than zero"));
    }

    if config.control.channel_capacity == 0 {
        errors.push(err("control.channel_capacity", "must be greater than zero"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(err(
            "observability.metrics_address",
            format!(
                "not a valid socket address: {}",
                config.observability.metrics_address
            ),
        ));
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

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = EngineConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.fallback_delay_ms = 0;
        config.control.channel_capacity = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "listener.bind_address"));
    }

    #[test]
    fn safety_net_must_outlast_fallback() {
        let mut config = EngineConfig::default();
        config.timeouts.fallback_delay_ms = 10_000;
        config.timeouts.response_timeout_ms = 10_000;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "timeouts.response_timeout_ms");
    }
}
