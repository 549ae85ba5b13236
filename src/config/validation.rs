use crate::config::types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use crate::url::normalize_url;
use crate::ConfigError;
use std::collections::BTreeMap;

/// Upper bound for `max-retries`
pub const MAX_RETRIES: u32 = 10;

/// Upper bound for both worker limits
pub const MAX_WORKERS: usize = 1024;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_categories(&config.categories)?;
    Ok(())
}

/// Validates crawler limits and timings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let positive = [
        ("max_pages_per_domain", config.max_pages_per_domain as u64),
        ("request_timeout_ms", config.request_timeout_ms),
        ("politeness_delay_ms", config.politeness_delay_ms),
        ("max_workers_per_domain", config.max_workers_per_domain as u64),
        ("max_global_workers", config.max_global_workers as u64),
        ("queue_capacity", config.queue_capacity as u64),
        ("idle_timeout_ms", config.idle_timeout_ms),
    ];

    for (name, value) in positive {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    if config.max_retries > MAX_RETRIES {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= {}, got {}",
            MAX_RETRIES, config.max_retries
        )));
    }

    let workers = [
        ("max_workers_per_domain", config.max_workers_per_domain),
        ("max_global_workers", config.max_global_workers),
    ];

    for (name, value) in workers {
        if value > MAX_WORKERS {
            return Err(ConfigError::Validation(format!(
                "{} must be <= {}, got {}",
                name, MAX_WORKERS, value
            )));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact_url) = &config.contact_url {
        normalize_url(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the category table; blank domain entries are tolerated and
/// skipped later during job expansion
fn validate_categories(categories: &BTreeMap<String, Vec<String>>) -> Result<(), ConfigError> {
    if categories.is_empty() {
        return Err(ConfigError::Validation(
            "at least one category must be configured".to_string(),
        ));
    }

    for (category, domains) in categories {
        if category.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category names cannot be empty".to_string(),
            ));
        }

        for domain in domains.iter().map(|d| d.trim()).filter(|d| !d.is_empty()) {
            validate_domain(domain)?;
        }
    }

    Ok(())
}

/// Validates a domain entry, which may carry an explicit `:port`
fn validate_domain(domain: &str) -> Result<(), ConfigError> {
    let host = match domain.rsplit_once(':') {
        Some((host, port)) => {
            port.parse::<u16>().map_err(|_| {
                ConfigError::InvalidPattern(format!("Domain '{}' has an invalid port", domain))
            })?;
            host
        }
        None => domain,
    };

    validate_domain_string(host)
}

/// Validates a bare hostname
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    // Check for invalid characters
    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    // Check that it doesn't start or end with a dot or hyphen
    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    // Check for consecutive dots
    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    // Must contain at least one dot (e.g., example.com, not just "example")
    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}
