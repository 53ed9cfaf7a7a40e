use crate::config::types::{
    Config, CrawlerConfig, FieldKindEntry, OutputConfig, Pagination, SchemaConfig, SiteConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_site_config(&config.site)?;
    validate_output_config(&config.output)?;
    validate_schema_config(&config.schema)?;
    Ok(())
}

/// Validates crawler configuration
pub(crate) fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.start_page < 1 {
        return Err(ConfigError::Validation(
            "start_page must be >= 1".to_string(),
        ));
    }

    if let Some(ceiling) = config.page_ceiling {
        if ceiling < config.start_page {
            return Err(ConfigError::Validation(format!(
                "page_ceiling ({}) must be >= start_page ({})",
                ceiling, config.start_page
            )));
        }
    }

    if config.items_per_page < 1 || config.items_per_page > 1000 {
        return Err(ConfigError::Validation(format!(
            "items_per_page must be between 1 and 1000, got {}",
            config.items_per_page
        )));
    }

    if config.max_retries < 1 || config.max_retries > 20 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be between 1 and 20, got {}",
            config.max_retries
        )));
    }

    if config.poll_interval_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "poll_interval_ms must be >= 10ms, got {}ms",
            config.poll_interval_ms
        )));
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

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates site URLs and locators
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    if !config.list_url.contains("{page}") && config.pagination == Pagination::Url {
        return Err(ConfigError::Validation(format!(
            "list_url '{}' must contain a {{page}} placeholder for url pagination",
            config.list_url
        )));
    }

    let sample = config.list_url_for(1);
    let url = Url::parse(&sample)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid list_url '{}': {}", sample, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "list_url '{}' must use http or https",
            config.list_url
        )));
    }

    validate_locator(&config.list_ready)?;
    validate_locator(&config.item_link)?;
    if let Some(item_ready) = &config.item_ready {
        validate_locator(item_ready)?;
    }

    match (&config.pagination, &config.next_page) {
        (Pagination::NextControl, None) => {
            return Err(ConfigError::Validation(
                "next_page locator is required for next-control pagination".to_string(),
            ));
        }
        (_, Some(next_page)) => validate_locator(next_page)?,
        _ => {}
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation("path cannot be empty".to_string()));
    }

    if let Some(summary_path) = &config.summary_path {
        if summary_path.is_empty() {
            return Err(ConfigError::Validation(
                "summary_path cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates the field schema: unique names and columns, usable locators
fn validate_schema_config(config: &SchemaConfig) -> Result<(), ConfigError> {
    if config.fields.is_empty() {
        return Err(ConfigError::Validation(
            "schema must declare at least one field".to_string(),
        ));
    }

    let mut names = HashSet::new();
    let mut columns = HashSet::new();
    let mut headings = HashSet::new();
    let mut has_section = false;

    for field in &config.fields {
        if field.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "field name cannot be empty".to_string(),
            ));
        }
        if !names.insert(field.name.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate field name '{}'",
                field.name
            )));
        }

        let capacity = match &field.kind {
            FieldKindEntry::Text { locator } => {
                validate_locator(locator)?;
                None
            }
            FieldKindEntry::List { locator, capacity } => {
                validate_locator(locator)?;
                Some(*capacity)
            }
            FieldKindEntry::Section {
                heading,
                entry,
                capacity,
            } => {
                validate_locator(entry)?;
                has_section = true;
                if !headings.insert(heading.trim().to_lowercase()) {
                    return Err(ConfigError::Validation(format!(
                        "section heading '{}' is claimed by more than one field",
                        heading
                    )));
                }
                Some(*capacity)
            }
            FieldKindEntry::Constant { .. } => None,
        };

        let field_columns = match capacity {
            Some(0) => {
                return Err(ConfigError::Validation(format!(
                    "field '{}' must have a capacity of at least 1",
                    field.name
                )));
            }
            Some(n) => (1..=n).map(|i| format!("{} {}", field.name, i)).collect(),
            None => vec![field.name.clone()],
        };

        for column in field_columns {
            if !columns.insert(column.clone()) {
                return Err(ConfigError::Validation(format!(
                    "column '{}' is produced by more than one field",
                    column
                )));
            }
        }
    }

    if has_section {
        match (&config.section, &config.section_heading) {
            (Some(section), Some(heading)) => {
                validate_locator(section)?;
                validate_locator(heading)?;
            }
            _ => {
                return Err(ConfigError::Validation(
                    "section fields require both schema.section and schema.section-heading"
                        .to_string(),
                ));
            }
        }
    }

    Ok(())
}

/// Checks that a locator is a parseable CSS selector
fn validate_locator(locator: &str) -> Result<(), ConfigError> {
    if locator.trim().is_empty() {
        return Err(ConfigError::InvalidLocator {
            locator: locator.to_string(),
            message: "locator cannot be empty".to_string(),
        });
    }

    Selector::parse(locator).map_err(|e| ConfigError::InvalidLocator {
        locator: locator.to_string(),
        message: e.to_string(),
    })?;

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
