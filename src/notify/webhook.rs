//! Webhook sink: POSTs the notification as JSON.

use std::time::Duration;
use async_trait::async_trait;
use url::Url;

use crate::notify::{Notification, NotificationSink, NotifyError};

/// Response bodies longer than this are cut in error messages.
const MAX_ERROR_BODY: usize = 512;

pub struct WebhookSink {
    url: Url,
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let url = Url::parse(url).map_err(|e| NotifyError::InvalidSink(format!("{}: {}", url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(NotifyError::InvalidSink(format!("unsupported scheme {}", url.scheme())));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("health-alerter/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { url, client })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(notification)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(alert = %notification.alert, status = status.as_u16(), "Webhook accepted notification");
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(NotifyError::Status { status: status.as_u16(), body })
    }
}
