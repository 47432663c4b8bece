//! Notification subsystem.
//!
//! # Data Flow
//! ```text
//! AlertEvent (from the evaluator)
//!     → dispatcher.rs (filter by state, dedup, re-queue leftovers)
//!     → template.rs (render recipient/subject/body)
//!     → sinks: webhook.rs (HTTP POST) | log.rs (structured log line)
//! ```
//!
//! # Design Decisions
//! - Only FIRING and RESOLVED are delivered
//! - A delivery failure never blocks the evaluation loop for longer than
//!   the retry budget; the event is re-queued for the next dispatch

pub mod dispatcher;
pub mod log;
pub mod template;
pub mod webhook;

use std::collections::BTreeMap;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::NotificationConfig;
use crate::evaluator::AlertState;

pub use dispatcher::{DispatchReport, Dispatcher};
pub use log::LogSink;
pub use template::NotificationTemplate;
pub use webhook::WebhookSink;

/// A rendered, ready-to-send notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Id of the originating event.
    pub id: Uuid,
    pub alert: String,
    pub state: AlertState,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("receiver returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid sink configuration: {0}")]
    InvalidSink(String),
}

/// A delivery channel.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Sink name used in logs and metrics.
    fn name(&self) -> &str;

    /// Deliver once. Retries are the dispatcher's job.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Build the sinks described by `config`.
///
/// A webhook URL selects the webhook sink; otherwise notifications go to the log.
pub fn sinks_from_config(config: &NotificationConfig) -> Result<Vec<Arc<dyn NotificationSink>>, NotifyError> {
    match &config.webhook_url {
        Some(url) => Ok(vec![Arc::new(WebhookSink::new(url, config.timeout)?)]),
        None => Ok(vec![Arc::new(LogSink::new())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_selection() {
        let config = NotificationConfig::default();
        let sinks = sinks_from_config(&config).unwrap();
        assert_eq!(sinks.len(), 1);
        assert_eq!(sinks[0].name(), "log");

        let config = NotificationConfig {
            webhook_url: Some("http://127.0.0.1:9/hook".to_string()),
            ..Default::default()
        };
        let sinks = sinks_from_config(&config).unwrap();
        assert_eq!(sinks[0].name(), "webhook");
    }

    #[test]
    fn test_bad_webhook_url_rejected() {
        let config = NotificationConfig {
            webhook_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(matches!(sinks_from_config(&config), Err(NotifyError::InvalidSink(_))));
    }
}
