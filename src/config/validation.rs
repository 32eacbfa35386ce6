use crate::config::types::{Config, HttpConfig, ScheduleConfig, SourceConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_schedule_config(&config.schedule)?;
    validate_http_config(&config.http)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates the source page URL
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid source url '{}': {}", config.url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Source url '{}' must use http or https",
            config.url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Source url '{}' has no host",
            config.url
        )));
    }

    Ok(())
}

/// Validates the job interval
fn validate_schedule_config(config: &ScheduleConfig) -> Result<(), ConfigError> {
    if config.interval_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "interval_secs must be >= 1, got {}",
            config.interval_secs
        )));
    }

    Ok(())
}

/// Validates HTTP client settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 || config.connect_timeout_secs > config.timeout_secs {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be between 1 and timeout_secs ({}), got {}",
            config.timeout_secs, config.connect_timeout_secs
        )));
    }

    Ok(())
}

/// Validates storage settings
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.default_quantity < 0 {
        return Err(ConfigError::Validation(format!(
            "default_quantity must be >= 0, got {}",
            config.default_quantity
        )));
    }

    Ok(())
}
