//! Configuration validation for Waitline services.
//!
//! Catches values that would otherwise only surface as odd behavior at
//! request time (an empty store name, a webhook path the router rejects).

use std::collections::HashSet;
use thiserror::Error;

use crate::config::{ClovaConfig, Config, ObservabilityConfig, RESERVED_PATHS};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["json", "pretty"];

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

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if self.clova_port() == 0 {
            errors.push(ValidationError::InvalidPort {
                port: 0,
                field: "services.clova.port".into(),
            });
        }

        if self.network.bind.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "network.bind".into(),
            });
        }

        if let Err(e) = self.clova.validate() {
            errors.push(e);
        }

        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }

    /// Load (with environment overrides) and validate configuration.
    pub fn load_and_validate() -> anyhow::Result<Self> {
        let config = Self::load_with_env()?;
        config.validate().map_err(crate::Error::from)?;
        Ok(config)
    }
}

impl Validate for ClovaConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !self.webhook_path.starts_with('/') {
            return Err(ValidationError::InvalidValue {
                field: "clova.webhook_path".into(),
                reason: "must start with '/'".into(),
            });
        }

        if RESERVED_PATHS.contains(&self.webhook_path.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "clova.webhook_path".into(),
                reason: format!("'{}' is already served by another route", self.webhook_path),
            });
        }

        if self.body_limit_bytes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "clova.body_limit_bytes".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "clova.request_timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        let mut seen = HashSet::new();
        for (i, store) in self.stores.iter().enumerate() {
            if store.trim().is_empty() {
                return Err(ValidationError::MissingField {
                    field: format!("clova.stores[{i}]"),
                });
            }
            if !seen.insert(store.as_str()) {
                return Err(ValidationError::InvalidValue {
                    field: format!("clova.stores[{i}]"),
                    reason: format!("duplicate store name '{store}'"),
                });
            }
        }

        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of {}", LOG_LEVELS.join(", ")),
            });
        }

        if !LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of {}", LOG_FORMATS.join(", ")),
            });
        }

        Ok(())
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
        config.services.clova.port = Some(0);
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidPort { port: 0, .. })
        ));
    }

    #[test]
    fn test_webhook_path_must_be_absolute() {
        let mut clova = ClovaConfig::default();
        clova.webhook_path = "clova".into();
        assert!(matches!(
            clova.validate(),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_webhook_path_must_not_shadow_other_routes() {
        let test_cases = vec![
            ("/clova", true),
            ("/extension/waiting", true),
            ("/health", false),
            ("/ready", false),
            ("/api/v1/waiting", false),
        ];

        for (path, expected_ok) in test_cases {
            let mut clova = ClovaConfig::default();
            clova.webhook_path = path.into();
            assert_eq!(clova.validate().is_ok(), expected_ok, "path: {path}");
        }
    }

    #[test]
    fn test_store_names() {
        let test_cases = vec![
            (vec!["A", "B"], true),
            (vec![], true),
            (vec!["A", ""], false),
            (vec!["A", "  "], false),
            (vec!["A", "B", "A"], false),
        ];

        for (stores, expected_ok) in test_cases {
            let mut clova = ClovaConfig::default();
            clova.stores = stores.iter().map(|s| s.to_string()).collect();
            assert_eq!(
                clova.validate().is_ok(),
                expected_ok,
                "stores: {stores:?}"
            );
        }
    }

    #[test]
    fn test_observability_values() {
        let mut obs = ObservabilityConfig::default();
        obs.log_level = "WARN".into();
        assert!(obs.validate().is_ok());

        obs.log_level = "verbose".into();
        assert!(obs.validate().is_err());

        obs.log_level = "info".into();
        obs.log_format = "xml".into();
        assert!(obs.validate().is_err());
    }

    #[test]
    fn test_multiple_errors_aggregate() {
        let mut config = Config::default();
        config.services.clova.port = Some(0);
        config.observability.log_format = "xml".into();

        match config.validate() {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }
}
