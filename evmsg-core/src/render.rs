//! Rendering a [`NotificationBatch`] into the HTML email body.

use crate::batch::NotificationBatch;
use minijinja::{Environment, Value, context};
use std::path::Path;
use thiserror::Error;
use time::macros::format_description;

const TEMPLATE_NAME: &str = "notification_email.html";
const DEFAULT_TEMPLATE: &str = include_str!("../templates/notification_email.html");

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("failed to read template file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to format event date: {0}")]
    DateFormat(#[from] time::error::Format),
}

/// Turns a batch into a delivery payload. Must be a pure function of the batch.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, batch: &NotificationBatch) -> Result<String, RenderError>;
}

/// [`TemplateRenderer`] backed by a single minijinja HTML template.
///
/// Output is HTML auto-escaped; only the image data URIs are inserted raw.
pub struct MinijinjaRenderer {
    env: Environment<'static>,
}

impl MinijinjaRenderer {
    /// Renderer using the built-in template.
    pub fn new() -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, DEFAULT_TEMPLATE)?;
        Ok(Self { env })
    }

    pub fn from_source(source: String) -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.add_template_owned(TEMPLATE_NAME, source)?;
        Ok(Self { env })
    }

    /// Renderer using the template file at `path` instead of the built-in one.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_source(source)
    }
}

impl TemplateRenderer for MinijinjaRenderer {
    fn render(&self, batch: &NotificationBatch) -> Result<String, RenderError> {
        let meta = &batch.metadata;
        let event_date = meta
            .event_date
            .format(format_description!("[month repr:long] [day padding:none], [year]"))?;

        let submissions: Vec<Value> = batch
            .entries
            .iter()
            .map(|entry| {
                let image = entry
                    .image
                    .as_ref()
                    .map(|i| i.data_uri())
                    .unwrap_or_default();
                context! {
                    message => entry.message,
                    from => entry.author,
                    image_data_uri => Value::from_safe_string(image),
                }
            })
            .collect();

        let template = self.env.get_template(TEMPLATE_NAME)?;
        let html = template.render(context! {
            event_name => meta.event_name,
            recipient_name => meta.recipient_name,
            event_date => event_date,
            coordinator_name => meta.coordinator_name,
            total_count => meta.total_count,
            shown_count => batch.len(),
            truncated => batch.is_truncated(),
            submissions => submissions,
        })?;
        Ok(html)
    }
}
