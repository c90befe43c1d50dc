//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{CampusEventsError, Result};
use super::{Settings, StorageBackend};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_auth_config(&settings.auth)?;
    validate_site_config(&settings.site)?;
    validate_payments_config(&settings.payments)?;
    validate_storage_config(&settings.storage)?;
    validate_rate_limit_config(&settings.rate_limit)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(CampusEventsError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(CampusEventsError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(CampusEventsError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(CampusEventsError::Config(
            "Redis URL is required".to_string()
        ));
    }

    Ok(())
}

/// Validate access token settings
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.is_empty() {
        return Err(CampusEventsError::Config(
            "JWT secret is required".to_string()
        ));
    }

    if config.cookie_name.is_empty() {
        return Err(CampusEventsError::Config(
            "Session cookie name is required".to_string()
        ));
    }

    Ok(())
}

fn validate_site_config(config: &super::SiteConfig) -> Result<()> {
    url::Url::parse(&config.base_url).map_err(|e| {
        CampusEventsError::Config(format!("Invalid site base URL {}: {}", config.base_url, e))
    })?;

    Ok(())
}

/// Validate payment gateway configuration
fn validate_payments_config(config: &super::PaymentsConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    if config.razorpay_key_id.is_empty() || config.razorpay_key_secret.is_empty() {
        return Err(CampusEventsError::Config(
            "Razorpay key id and secret are required when payments are enabled".to_string()
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(CampusEventsError::Config(
            "Payment gateway timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate object storage configuration
fn validate_storage_config(config: &super::StorageConfig) -> Result<()> {
    if config.bucket.is_empty() {
        return Err(CampusEventsError::Config(
            "Storage bucket is required".to_string()
        ));
    }

    if config.backend == StorageBackend::S3
        && (config.access_key_id.is_none() || config.secret_access_key.is_none())
    {
        return Err(CampusEventsError::Config(
            "S3 storage requires access_key_id and secret_access_key".to_string()
        ));
    }

    url::Url::parse(&config.public_base_url).map_err(|e| {
        CampusEventsError::Config(format!("Invalid storage public URL: {}", e))
    })?;

    Ok(())
}

fn validate_rate_limit_config(config: &super::RateLimitSettings) -> Result<()> {
    if config.max_requests == 0 || config.window_seconds == 0 {
        return Err(CampusEventsError::Config(
            "Rate limit requests and window must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(CampusEventsError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(CampusEventsError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.auth.jwt_secret = "test-secret".to_string();
        settings
    }

    #[test]
    fn test_default_settings_need_a_secret() {
        let result = validate_settings(&Settings::default());
        assert_matches!(result, Err(CampusEventsError::Config(msg)) if msg.contains("JWT secret"));
    }

    #[test]
    fn test_valid_settings() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn test_enabled_payments_need_keys() {
        let mut settings = valid_settings();
        settings.payments.enabled = true;
        assert!(validate_settings(&settings).is_err());

        settings.payments.razorpay_key_id = "rzp_test".to_string();
        settings.payments.razorpay_key_secret = "secret".to_string();
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_s3_storage_needs_credentials() {
        let mut settings = valid_settings();
        settings.storage.backend = StorageBackend::S3;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut settings = valid_settings();
        settings.logging.level = "verbose".to_string();
        assert!(validate_settings(&settings).is_err());
    }
}
