//! Outgoing mail delivery.
//!
//! The core never speaks SMTP. [`HttpMailTransport`] hands the rendered
//! message to an HTTP mail relay as a JSON document:
//!
//! ```json
//! { "from": "...", "to": "...", "subject": "...", "html": "..." }
//! ```
//!
//! authenticated with `Authorization: Bearer <api_key>`. Any 2xx response
//! counts as delivered.

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during mail delivery.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The relay answered with a non-2xx status
    #[error("mail delivery failed with status {status}: {body}")]
    DeliveryFailed { status: u16, body: String },

    /// Any other transport failure
    #[error("mail transport error: {0}")]
    Transport(String),
}

/// A rendered message ready to be handed to a [`MailTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one message. Returns only once the transport accepted it.
    async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError>;
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// [`MailTransport`] posting messages to an HTTP mail relay.
pub struct HttpMailTransport {
    endpoint: Url,
    api_key: String,
    from: String,
    http_client: reqwest::Client,
}

impl HttpMailTransport {
    pub fn new(endpoint: Url, api_key: String, from: String, timeout: Duration) -> Self {
        Self {
            endpoint,
            api_key,
            from,
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        let body = RelayRequest {
            from: &self.from,
            to: &mail.to,
            subject: &mail.subject,
            html: &mail.html,
        };

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(to = %mail.to, status = status.as_u16(), "Mail accepted by relay");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(DeliveryError::DeliveryFailed {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_request_shape() {
        let body = RelayRequest {
            from: "noreply@example.com",
            to: "alex@example.com",
            subject: "Your Graduation Messages",
            html: "<p>hi</p>",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "from": "noreply@example.com",
                "to": "alex@example.com",
                "subject": "Your Graduation Messages",
                "html": "<p>hi</p>",
            })
        );
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_an_error() {
        // Port 9 (discard) on loopback is expected to refuse connections.
        let transport = HttpMailTransport::new(
            Url::parse("http://127.0.0.1:9/send").unwrap(),
            "key".to_string(),
            "noreply@example.com".to_string(),
            Duration::from_secs(2),
        );
        let mail = OutgoingMail {
            to: "alex@example.com".to_string(),
            subject: "s".to_string(),
            html: "h".to_string(),
        };
        assert!(matches!(
            transport.send(&mail).await,
            Err(DeliveryError::Request(_))
        ));
    }
}
