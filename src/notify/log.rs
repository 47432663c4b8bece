//! Sink that writes notifications to the structured log.

use async_trait::async_trait;

use crate::notify::{Notification, NotificationSink, NotifyError};

#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::warn!(
            id = %notification.id,
            alert = %notification.alert,
            state = %notification.state,
            recipient = %notification.recipient,
            subject = %notification.subject,
            body = %notification.body,
            "Alert notification"
        );
        Ok(())
    }
}
