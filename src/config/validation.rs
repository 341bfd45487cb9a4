//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (caps > 0, timeouts > 0)
//! - Check cross-field consistency (object cap vs. aggregate cap)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("listener.max_connections must be greater than zero")]
    ZeroMaxConnections,

    #[error("cache.max_object_bytes must be greater than zero")]
    ZeroObjectCap,

    #[error("cache.max_cache_bytes must be greater than zero")]
    ZeroCacheCap,

    #[error("cache.max_object_bytes ({object}) exceeds cache.max_cache_bytes ({total})")]
    ObjectCapExceedsTotal { object: usize, total: usize },

    #[error("timeouts.connect_secs must be greater than zero")]
    ZeroConnectTimeout,

    #[error("observability.metrics_address '{0}' is not a valid socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }

    if config.cache.max_object_bytes == 0 {
        errors.push(ValidationError::ZeroObjectCap);
    }
    if config.cache.max_cache_bytes == 0 {
        errors.push(ValidationError::ZeroCacheCap);
    }
    if config.cache.max_object_bytes > config.cache.max_cache_bytes {
        errors.push(ValidationError::ObjectCapExceedsTotal {
            object: config.cache.max_object_bytes,
            total: config.cache.max_cache_bytes,
        });
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
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
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn rejects_object_cap_above_total() {
        let mut config = ProxyConfig::default();
        config.cache.max_object_bytes = 2 * 1024 * 1024;
        config.cache.max_cache_bytes = 1024 * 1024;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ObjectCapExceedsTotal { .. })));
    }

    #[test]
    fn collects_all_errors_not_just_first() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        config.listener.max_connections = 0;
        config.cache.max_cache_bytes = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3);
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "bogus".to_string();

        config.observability.metrics_enabled = false;
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
