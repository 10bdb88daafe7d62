//! Configuration module for evmsg-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{MailConfig, ServerConfig, StorageConfig};
use evmsg_core::config::SchedulerConfig;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use time::macros::format_description;
use time::{Time, UtcOffset};

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub scheduler: SchedulerConfig,
    pub mail: MailConfig,
    pub storage: StorageConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Read, validate and convert the configuration file.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        parse_config(&config_content, self.listen_override)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }
}

/// Parse and validate configuration file content.
pub fn parse_config(
    content: &str,
    listen_override: Option<SocketAddr>,
) -> Result<LoadedConfig, ConfigError> {
    let mut file_config: FileConfig = toml::from_str(content)?;

    if let Some(listen) = listen_override {
        file_config.server.listen = listen;
    }

    validate(&file_config)?;
    build_loaded_config(file_config)
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    let scheduler = &config.scheduler;
    if scheduler.notification_hour > 23 {
        return Err(ConfigError::ValidationError(format!(
            "scheduler.notification_hour must be between 0 and 23, got {}",
            scheduler.notification_hour
        )));
    }
    if scheduler.submission_cap == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.submission_cap must be at least 1".to_string(),
        ));
    }
    if scheduler.task_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.task_timeout_secs must be at least 1".to_string(),
        ));
    }
    if config.mail.from.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "mail.from must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
    let FileConfig {
        server,
        scheduler,
        mail,
        storage,
    } = file_config;

    let utc_offset = match scheduler.utc_offset.as_deref() {
        Some(raw) => parse_utc_offset(raw)?,
        None => host_offset(),
    };
    let notification_time = Time::from_hms(scheduler.notification_hour, 0, 0)
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    Ok(LoadedConfig {
        server: ServerConfig {
            listen: server.listen,
            base_url: server.base_url,
        },
        scheduler: SchedulerConfig {
            notification_time,
            grace_days: scheduler.grace_days,
            submission_cap: scheduler.submission_cap,
            utc_offset,
            task_timeout: Duration::from_secs(scheduler.task_timeout_secs),
        },
        mail: MailConfig {
            endpoint: mail.endpoint,
            api_key: mail.api_key,
            from: mail.from,
            timeout: Duration::from_secs(mail.timeout_secs),
        },
        storage: StorageConfig {
            upload_dir: storage.upload_dir,
            email_template: storage.email_template,
        },
    })
}

/// Parse an offset such as `+02:00`, `-05:30` or `Z`.
fn parse_utc_offset(raw: &str) -> Result<UtcOffset, ConfigError> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(UtcOffset::UTC);
    }
    UtcOffset::parse(
        raw,
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .map_err(|e| {
        ConfigError::ValidationError(format!("scheduler.utc_offset {raw:?} is invalid: {e}"))
    })
}

fn host_offset() -> UtcOffset {
    match UtcOffset::current_local_offset() {
        Ok(offset) => offset,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Could not determine the host UTC offset, using UTC; set scheduler.utc_offset to override"
            );
            UtcOffset::UTC
        }
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{offset, time};

    const BASE: &str = r#"
[server]
base_url = "https://messages.example.com"

[mail]
endpoint = "https://relay.example.com/send"
api_key = "k"
from = "noreply@example.com"
"#;

    fn with_scheduler(section: &str) -> String {
        format!("{BASE}\n[scheduler]\n{section}\n")
    }

    #[test]
    fn test_builds_scheduler_config() {
        let loaded = parse_config(
            &with_scheduler("notification_hour = 7\nutc_offset = \"+09:00\"\ngrace_days = 3"),
            None,
        )
        .unwrap();
        assert_eq!(loaded.scheduler.notification_time, time!(07:00));
        assert_eq!(loaded.scheduler.utc_offset, offset!(+09:00));
        assert_eq!(loaded.scheduler.grace_days, 3);
        assert_eq!(loaded.scheduler.submission_cap, 150);
        assert_eq!(loaded.scheduler.task_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_listen_override() {
        let listen: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let loaded = parse_config(BASE, Some(listen)).unwrap();
        assert_eq!(loaded.server.listen, listen);
    }

    #[test]
    fn test_rejects_out_of_range_hour() {
        let result = parse_config(&with_scheduler("notification_hour = 24"), None);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_rejects_zero_cap() {
        let result = parse_config(&with_scheduler("submission_cap = 0"), None);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_rejects_bad_offset() {
        let result = parse_config(&with_scheduler("utc_offset = \"two hours\""), None);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_offset_forms() {
        assert_eq!(parse_utc_offset("Z").unwrap(), UtcOffset::UTC);
        assert_eq!(parse_utc_offset("-05:30").unwrap(), offset!(-05:30));
        assert_eq!(parse_utc_offset("+00:00").unwrap(), UtcOffset::UTC);
    }

    #[test]
    fn test_missing_file() {
        let loader = ConfigLoader::new("/nonexistent/evmsg-config.toml", None);
        assert!(matches!(loader.load(), Err(ConfigError::IoError(_))));
    }
}
