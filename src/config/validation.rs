use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, ScopeConfig, SecondaryDomain, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_scope(&config.scope)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 100 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 100, got {}",
            config.workers
        )));
    }

    if config.request_timeout < 100 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 100ms, got {}ms",
            config.request_timeout
        )));
    }

    if config.dequeue_timeout < 10 {
        return Err(ConfigError::Validation(format!(
            "dequeue_timeout must be >= 10ms, got {}ms",
            config.dequeue_timeout
        )));
    }

    if config.status_interval == 0 || config.checkpoint_interval == 0 {
        return Err(ConfigError::Validation(
            "status_interval and checkpoint_interval must be >= 1s".to_string(),
        ));
    }

    if config.milestone_interval == 0 {
        return Err(ConfigError::Validation(
            "milestone_interval must be >= 1".to_string(),
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

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("pages_dir", &config.pages_dir),
        ("scraped_file", &config.scraped_file),
        ("queue_file", &config.queue_file),
        ("checkpoint_file", &config.checkpoint_file),
        ("index_path", &config.index_path),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.scraped_file == config.queue_file {
        return Err(ConfigError::Validation(
            "scraped_file and queue_file must differ".to_string(),
        ));
    }

    if config.page_extension.is_empty()
        || !config
            .page_extension
            .chars()
            .all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ConfigError::Validation(format!(
            "page_extension must be non-empty and alphanumeric, got '{}'",
            config.page_extension
        )));
    }

    if config.index_width == 0 || config.index_width > 20 {
        return Err(ConfigError::Validation(format!(
            "index_width must be between 1 and 20, got {}",
            config.index_width
        )));
    }

    Ok(())
}

/// Validates seeds, domain patterns and blacklists
fn validate_scope(scope: &ScopeConfig) -> Result<(), ConfigError> {
    if scope.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "scope must have at least one seed URL".to_string(),
        ));
    }

    for seed in &scope.seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use HTTP or HTTPS",
                seed
            )));
        }
    }

    if scope.domains.is_empty() {
        return Err(ConfigError::Validation(
            "scope must list at least one in-scope domain".to_string(),
        ));
    }

    for pattern in &scope.domains {
        validate_domain_pattern(pattern)?;
    }

    for entry in &scope.secondary {
        validate_secondary(entry)?;
    }

    for ext in &scope.blocked_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::Validation(format!(
                "Blocked extension '{}' must look like '.ext'",
                ext
            )));
        }
    }

    Ok(())
}

/// Validates a secondary domain entry
fn validate_secondary(entry: &SecondaryDomain) -> Result<(), ConfigError> {
    if entry.domain.starts_with("*.") {
        return Err(ConfigError::InvalidPattern(format!(
            "Secondary domain '{}' must be an exact host",
            entry.domain
        )));
    }

    validate_domain_string(&entry.domain)?;

    if entry.indicators.is_empty() && entry.path_patterns.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Secondary domain '{}' needs at least one indicator or path pattern",
            entry.domain
        )));
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)?;
    } else {
        validate_domain_string(pattern)?;
    }

    Ok(())
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

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

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.edu')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
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
