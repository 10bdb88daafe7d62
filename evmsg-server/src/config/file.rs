//! TOML file configuration structures.
//!
//! These structs directly map to the `evmsg-config.toml` file format.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    pub mail: MailConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
    /// Public URL of the site, used to build event website links.
    pub base_url: Url,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Scheduler configuration section. Reloaded on SIGHUP.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Local hour (0-23) of the daily notification run.
    #[serde(default = "default_notification_hour")]
    pub notification_hour: u8,
    /// Days to keep a notified event before deleting it.
    #[serde(default = "default_grace_days")]
    pub grace_days: u32,
    /// Maximum submissions per email.
    #[serde(default = "default_submission_cap")]
    pub submission_cap: usize,
    /// Offset defining local time, such as `"+02:00"`. Defaults to the
    /// host's offset.
    #[serde(default)]
    pub utc_offset: Option<String>,
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            notification_hour: default_notification_hour(),
            grace_days: default_grace_days(),
            submission_cap: default_submission_cap(),
            utc_offset: None,
            task_timeout_secs: default_task_timeout_secs(),
        }
    }
}

fn default_notification_hour() -> u8 {
    evmsg_core::config::DEFAULT_NOTIFICATION_HOUR
}

fn default_grace_days() -> u32 {
    evmsg_core::config::DEFAULT_GRACE_DAYS
}

fn default_submission_cap() -> usize {
    evmsg_core::config::DEFAULT_SUBMISSION_CAP
}

fn default_task_timeout_secs() -> u64 {
    evmsg_core::config::DEFAULT_TASK_TIMEOUT.as_secs()
}

/// Mail relay configuration section.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Relay endpoint receiving the JSON message.
    pub endpoint: Url,
    /// Bearer token for the relay.
    pub api_key: String,
    /// Sender address.
    pub from: String,
    #[serde(default = "default_mail_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_mail_timeout_secs() -> u64 {
    30
}

/// Storage configuration section.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding uploaded images.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Replacement for the built-in email template.
    #[serde(default)]
    pub email_template: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            email_template: None,
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./data/uploads")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"
base_url = "https://messages.example.com"

[scheduler]
notification_hour = 9
grace_days = 14
submission_cap = 50
utc_offset = "+02:00"
task_timeout_secs = 120

[mail]
endpoint = "https://relay.example.com/send"
api_key = "relay-key"
from = "noreply@example.com"
timeout_secs = 10

[storage]
upload_dir = "/var/lib/evmsg/uploads"
email_template = "/etc/evmsg/email.html"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.server.base_url.host_str(), Some("messages.example.com"));
        assert_eq!(config.scheduler.notification_hour, 9);
        assert_eq!(config.scheduler.grace_days, 14);
        assert_eq!(config.scheduler.submission_cap, 50);
        assert_eq!(config.scheduler.utc_offset.as_deref(), Some("+02:00"));
        assert_eq!(config.mail.timeout_secs, 10);
        assert_eq!(
            config.storage.email_template,
            Some(PathBuf::from("/etc/evmsg/email.html"))
        );
    }

    #[test]
    fn test_defaults_apply() {
        let toml_str = r#"
[server]
base_url = "http://localhost:8080"

[mail]
endpoint = "http://localhost:9000/send"
api_key = "k"
from = "noreply@localhost"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert_eq!(config.scheduler.notification_hour, 8);
        assert_eq!(config.scheduler.grace_days, 30);
        assert_eq!(config.scheduler.submission_cap, 150);
        assert_eq!(config.scheduler.task_timeout_secs, 600);
        assert_eq!(config.scheduler.utc_offset, None);
        assert_eq!(config.mail.timeout_secs, 30);
        assert_eq!(config.storage.upload_dir, PathBuf::from("./data/uploads"));
        assert_eq!(config.storage.email_template, None);
    }

    #[test]
    fn test_missing_mail_section_is_an_error() {
        let toml_str = r#"
[server]
base_url = "http://localhost:8080"
"#;
        assert!(toml::from_str::<FileConfig>(toml_str).is_err());
    }
}
