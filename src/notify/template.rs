//! `{{key}}` substitution for recipient, subject and body.

use std::collections::BTreeMap;

use crate::config::NotificationConfig;
use crate::evaluator::AlertEvent;
use crate::notify::Notification;

/// Templates applied to every delivered event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTemplate {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl NotificationTemplate {
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self {
            recipient: config.recipient.clone(),
            subject: config.subject.clone(),
            body: config.body.clone(),
        }
    }

    /// Render the notification for `event`.
    pub fn render(&self, event: &AlertEvent) -> Notification {
        let vars = event.template_vars();
        Notification {
            id: event.id,
            alert: event.name.clone(),
            state: event.state,
            recipient: render(&self.recipient, &vars),
            subject: render(&self.subject, &vars),
            body: render(&self.body, &vars),
            timestamp: event.timestamp,
            labels: event.labels.clone(),
            annotations: event.annotations.clone(),
        }
    }
}

/// Replace `{{ key }}` with `vars[key]`. Unknown keys are left verbatim.
pub fn render(template: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = after[..end].trim();
        match vars.get(key) {
            Some(value) => out.push_str(value),
            None => {
                tracing::debug!(key, "Unknown template placeholder");
                out.push_str(&rest[start..start + 2 + end + 2]);
            }
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}
