//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges (timeouts > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RedirectorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{RedirectorConfig, StoreBackend};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0}: must be greater than zero")]
    Zero(&'static str),

    #[error("store.path: required for the file backend")]
    MissingStorePath,

    #[error("access.cookie_prefix: must not be empty")]
    EmptyCookiePrefix,
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RedirectorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address("listener.bind_address", &config.listener.bind_address, &mut errors);
    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    if config.store.backend == StoreBackend::File && config.store.path.trim().is_empty() {
        errors.push(ValidationError::MissingStorePath);
    }
    if config.store.timeout_ms == 0 {
        errors.push(ValidationError::Zero("store.timeout_ms"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero("security.max_body_size"));
    }
    if config.access.cookie_max_age_secs == 0 {
        errors.push(ValidationError::Zero("access.cookie_max_age_secs"));
    }
    if config.access.cookie_prefix.is_empty() {
        errors.push(ValidationError::EmptyCookiePrefix);
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
    fn test_default_config_is_valid() {
        assert!(validate_config(&RedirectorConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RedirectorConfig::default();
        config.store.path = String::new();
        config.timeouts.request_secs = 0;
        config.access.cookie_prefix = String::new();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingStorePath,
                ValidationError::Zero("timeouts.request_secs"),
                ValidationError::EmptyCookiePrefix,
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = RedirectorConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("observability.metrics_address"));
    }

    #[test]
    fn test_memory_backend_needs_no_path() {
        let mut config = RedirectorConfig::default();
        config.store.backend = StoreBackend::Memory;
        config.store.path = String::new();
        assert!(validate_config(&config).is_ok());
    }
}
