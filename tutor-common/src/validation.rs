//! Configuration validation.
//!
//! Checked once at startup; any failure stops the process before it binds.

use thiserror::Error;

use crate::config::{Config, LlmConfig, NetworkConfig, ObservabilityConfig, RelayConfig};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port {port}: must be between 1 and 65535")]
    InvalidPort { port: u16, field: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["json", "pretty"];

fn invalid(field: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn collect(errors: Vec<ValidationError>) -> ValidationResult<()> {
    let mut errors = errors;
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let sections: [&dyn Validate; 4] =
            [&self.network, &self.llm, &self.relay, &self.observability];

        let errors = sections
            .iter()
            .filter_map(|section| section.validate().err())
            .flat_map(|e| match e {
                ValidationError::Multiple(inner) => inner,
                other => vec![other],
            })
            .collect();

        collect(errors)
    }

    /// Load, apply environment overrides, and validate configuration.
    pub fn load_and_validate() -> anyhow::Result<Self> {
        Self::load_with_env()?.validated()
    }

    /// Consume the configuration, returning it only if it validates.
    pub fn validated(self) -> anyhow::Result<Self> {
        self.validate()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;
        Ok(self)
    }
}

impl Validate for NetworkConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push(ValidationError::InvalidPort {
                port: self.port,
                field: "network.port".into(),
            });
        }

        if self.bind.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "network.bind".into(),
            });
        } else if self.bind.parse::<std::net::IpAddr>().is_err() {
            errors.push(invalid("network.bind", format!("'{}' is not an IP address", self.bind)));
        }

        collect(errors)
    }
}

impl Validate for LlmConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if self.model.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "llm.model".into(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            errors.push(invalid("llm.temperature", "must be between 0.0 and 2.0"));
        }
        if self.max_output_tokens <= 0 {
            errors.push(invalid("llm.max_output_tokens", "must be positive"));
        }
        if self.timeout_secs == 0 {
            errors.push(invalid("llm.timeout_secs", "must be positive"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            errors.push(invalid("llm.base_url", "must be an http(s) URL"));
        }

        collect(errors)
    }
}

impl Validate for RelayConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if self.max_turns < 2 {
            errors.push(invalid(
                "relay.max_turns",
                "must be at least 2 (priming turn plus one message)",
            ));
        }
        if self.context_window == 0 {
            errors.push(invalid("relay.context_window", "must be positive"));
        }
        if self.session_idle_secs == 0 {
            errors.push(invalid("relay.session_idle_secs", "must be positive"));
        }
        if self.sweep_interval_secs == 0 {
            errors.push(invalid("relay.sweep_interval_secs", "must be positive"));
        }
        if self.max_body_bytes == 0 {
            errors.push(invalid("relay.max_body_bytes", "must be positive"));
        }

        collect(errors)
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(invalid(
                "observability.log_level",
                format!("must be one of {LOG_LEVELS:?}"),
            ));
        }
        if !LOG_FORMATS.contains(&self.log_format.as_str()) {
            errors.push(invalid(
                "observability.log_format",
                format!("must be one of {LOG_FORMATS:?}"),
            ));
        }

        collect(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = Config::default();
        config.network.port = 0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidPort { port: 0, .. })
        ));
    }

    #[test]
    fn test_bad_bind_rejected() {
        let mut config = Config::default();
        config.network.bind = "localhost:80".into();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_ceiling_must_leave_room() {
        let mut config = Config::default();
        config.relay.max_turns = 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("relay.max_turns"));
    }

    #[test]
    fn test_validated_passes_through_or_rejects() {
        let config = Config::default().validated().unwrap();
        assert_eq!(config.network.port, 5000);

        let mut config = Config::default();
        config.relay.sweep_interval_secs = 0;
        let err = config.validated().unwrap_err();
        assert!(err.to_string().starts_with("Invalid configuration"));
    }

    #[test]
    fn test_multiple_errors_collected() {
        let mut config = Config::default();
        config.llm.temperature = 3.0;
        config.relay.context_window = 0;
        config.observability.log_format = "xml".into();

        match config.validate() {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }
}
