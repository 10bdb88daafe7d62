//! Validated configuration used by the running server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub base_url: Url,
}

impl ServerConfig {
    /// Public page listing the messages of the event `slug`.
    pub fn website_link(&self, slug: &str) -> String {
        format!(
            "{}/event/{}/messages",
            self.base_url.as_str().trim_end_matches('/'),
            slug
        )
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub endpoint: Url,
    pub api_key: String,
    pub from: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub email_template: Option<PathBuf>,
}
