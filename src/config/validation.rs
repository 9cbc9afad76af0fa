use crate::config::types::{
    Config, CrawlerConfig, DedupConfig, FetchConfig, OutputConfig, ScopeConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_fetch_config(&config.fetch)?;
    validate_dedup_config(&config.dedup)?;
    validate_scope_config(&config.scope)?;
    validate_output_config(&config.output)?;
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

    if config.sync_every < 1 {
        return Err(ConfigError::Validation(format!(
            "sync-every must be >= 1, got {}",
            config.sync_every
        )));
    }

    for seed in &config.seeds {
        let url = Url::parse(seed).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use http or https",
                seed
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
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates download limits
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.connect_timeout == 0 || config.read_timeout == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout and read-timeout must be > 0".to_string(),
        ));
    }

    if config.min_content_length > config.max_content_length {
        return Err(ConfigError::Validation(format!(
            "min-content-length ({}) exceeds max-content-length ({})",
            config.min_content_length, config.max_content_length
        )));
    }

    Ok(())
}

fn validate_dedup_config(config: &DedupConfig) -> Result<(), ConfigError> {
    let threshold = config.near_duplicate_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(ConfigError::Validation(format!(
            "near-duplicate-threshold must be in (0, 1], got {}",
            threshold
        )));
    }
    Ok(())
}

/// Validates scope rules
fn validate_scope_config(config: &ScopeConfig) -> Result<(), ConfigError> {
    if config.domains.is_empty() && config.path_restricted.is_empty() {
        return Err(ConfigError::Validation(
            "scope must name at least one domain or path-restricted host".to_string(),
        ));
    }

    for pattern in &config.domains {
        validate_domain_pattern(pattern)?;
    }

    for rule in &config.path_restricted {
        validate_domain_string(&rule.host)?;

        if !rule.path_prefix.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "path-prefix for '{}' must start with '/', got '{}'",
                rule.host, rule.path_prefix
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    let paths = [
        ("ledger-path", &config.ledger_path),
        ("dedup-path", &config.dedup_path),
        ("stats-path", &config.stats_path),
        ("report-path", &config.report_path),
    ];

    for (name, path) in paths {
        if path.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.status_interval < 1 {
        return Err(ConfigError::Validation(
            "status-interval must be >= 1 second".to_string(),
        ));
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

    match pattern.strip_prefix("*.") {
        Some(domain) => validate_domain_string(domain),
        None => validate_domain_string(pattern),
    }
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

    // Must contain at least one dot (e.g., example.com, not just "example")
    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::Validation(format!("Invalid contact-email: '{}'", email));

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }

    Ok(())
}
