use crate::config::types::{Config, CrawlerConfig, ProvisionerConfig, TargetConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_target_config(&config.target)?;
    validate_provisioner_config(&config.provisioner)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the request pipeline configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.rate_limit < 1 || config.rate_limit > 64 {
        return Err(ConfigError::Validation(format!(
            "rate_limit must be between 1 and 64, got {}",
            config.rate_limit
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.pool_size < 1 {
        return Err(ConfigError::Validation(format!(
            "pool_size must be >= 1, got {}",
            config.pool_size
        )));
    }

    Ok(())
}

/// Validates the crawl target configuration
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    if config.domain.is_empty() {
        return Err(ConfigError::Validation(
            "target domain cannot be empty".to_string(),
        ));
    }

    if config.domain.contains("://") || config.domain.contains('/') {
        return Err(ConfigError::Validation(format!(
            "target domain must be a bare host, got '{}'",
            config.domain
        )));
    }

    if config.scheme != "https" && config.scheme != "http" {
        return Err(ConfigError::Validation(format!(
            "scheme must be 'https' or 'http', got '{}'",
            config.scheme
        )));
    }

    Ok(())
}

/// Validates the provisioning service configuration
fn validate_provisioner_config(config: &ProvisionerConfig) -> Result<(), ConfigError> {
    Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid provisioner base_url: {}", e)))?;
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}
