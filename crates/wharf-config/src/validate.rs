//! Post-merge configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! acceptable ranges.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_storage(config)?;
    validate_installer(config)?;
    validate_logging(config)?;
    Ok(())
}

fn one_of(field: &str, value: &str, allowed: &[&str], what: &str) -> ConfigResult<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        field: field.to_owned(),
        message: format!(
            "unsupported {what} '{value}'; expected one of: {}",
            allowed.join(", ")
        ),
    })
}

fn validate_storage(config: &Config) -> ConfigResult<()> {
    one_of(
        "storage.backend",
        &config.storage.backend,
        &["json", "memory"],
        "storage backend",
    )?;

    if let Some(dir) = &config.storage.data_dir
        && dir.as_os_str().is_empty()
    {
        return Err(ConfigError::ValidationError {
            field: "storage.data_dir".to_owned(),
            message: "data_dir must not be empty".to_owned(),
        });
    }
    Ok(())
}

fn validate_installer(config: &Config) -> ConfigResult<()> {
    let i = &config.installer;

    if i.max_entries == 0 {
        return Err(ConfigError::ValidationError {
            field: "installer.max_entries".to_owned(),
            message: "max_entries must be at least 1".to_owned(),
        });
    }

    if i.max_extracted_bytes == 0 {
        return Err(ConfigError::ValidationError {
            field: "installer.max_extracted_bytes".to_owned(),
            message: "max_extracted_bytes must be at least 1".to_owned(),
        });
    }

    one_of(
        "installer.widget_id_policy",
        &i.widget_id_policy,
        &["hash", "trust"],
        "widget id policy",
    )
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    one_of(
        "logging.level",
        &config.logging.level,
        &["trace", "debug", "info", "warn", "error"],
        "log level",
    )?;
    one_of(
        "logging.format",
        &config.logging.format,
        &["pretty", "compact", "json", "full"],
        "log format",
    )
}
