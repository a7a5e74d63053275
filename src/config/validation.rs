use crate::config::types::{Config, CrawlerConfig, HostsConfig, Markers, UserAgentConfig};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_hosts(&config.hosts)?;
    validate_output_config(&config.output)?;
    validate_markers(&config.markers)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 64, got {}",
            config.concurrency
        )));
    }

    if config.max_bytes < 1024 {
        return Err(ConfigError::Validation(format!(
            "max_bytes must be >= 1024, got {}",
            config.max_bytes
        )));
    }

    if config.json_max_bytes < 1024 {
        return Err(ConfigError::Validation(format!(
            "json_max_bytes must be >= 1024, got {}",
            config.json_max_bytes
        )));
    }

    if config.timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be >= 100ms, got {}ms",
            config.timeout_ms
        )));
    }

    if config.early_abort_min_bytes > config.max_bytes {
        return Err(ConfigError::Validation(format!(
            "early_abort_min_bytes ({}) cannot exceed max_bytes ({})",
            config.early_abort_min_bytes, config.max_bytes
        )));
    }

    if config.review_page_size < 1 || config.review_page_size > 100 {
        return Err(ConfigError::Validation(format!(
            "review_page_size must be between 1 and 100, got {}",
            config.review_page_size
        )));
    }

    if config.max_review_pages < 1 {
        return Err(ConfigError::Validation(
            "max_review_pages must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
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

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates the candidate host list
fn validate_hosts(config: &HostsConfig) -> Result<(), ConfigError> {
    if config.candidates.is_empty() {
        return Err(ConfigError::Validation(
            "hosts.candidates must list at least one host".to_string(),
        ));
    }

    for host in &config.candidates {
        let url = Url::parse(host)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid host '{}': {}", host, e)))?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::Validation(format!(
                "Host '{}' must use http or https",
                host
            )));
        }

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "Host '{}' has no host name",
                host
            )));
        }
    }

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

/// Validates that every marker is usable
fn validate_markers(markers: &Markers) -> Result<(), ConfigError> {
    if markers.manifesto_classes.is_empty() || markers.meta_classes.is_empty() {
        return Err(ConfigError::Validation(
            "region markers need at least one class token".to_string(),
        ));
    }

    let tokens = markers
        .manifesto_classes
        .iter()
        .chain(markers.meta_classes.iter())
        .chain([&markers.manifesto_label_class, &markers.image_class]);
    for token in tokens {
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidPattern(format!(
                "class token '{}' must be a single non-empty word",
                token
            )));
        }
    }

    for pattern in [
        &markers.placeholder_pattern,
        &markers.asset_path_pattern,
        &markers.early_abort_pattern,
    ] {
        Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
