//! Notification dispatcher.
//!
//! # Responsibilities
//! - Deliver FIRING (and optionally RESOLVED) transitions to every sink
//! - Never deliver the same state twice in a row for one alert
//! - Keep undelivered notifications until they succeed or are superseded

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::NotificationConfig;
use crate::evaluator::{AlertEvent, AlertState};
use crate::notify::{sinks_from_config, Notification, NotificationSink, NotificationTemplate, NotifyError};
use crate::observability::metrics;
use crate::resilience::{retry, RetryPolicy};

/// Counts for one `dispatch` call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Notifications that reached every sink.
    pub delivered: usize,
    /// Events skipped by state filtering or dedup.
    pub suppressed: usize,
    /// Notifications still owed to at least one sink.
    pub failed: usize,
}

/// A notification with the sinks that have not accepted it yet.
struct Pending {
    notification: Notification,
    remaining: Vec<usize>,
}

pub struct Dispatcher {
    sinks: Vec<Arc<dyn NotificationSink>>,
    template: NotificationTemplate,
    policy: RetryPolicy,
    notify_resolved: bool,
    /// Last state fully delivered per alert.
    last_delivered: HashMap<String, AlertState>,
    /// At most one entry per alert.
    pending: Vec<Pending>,
}

impl Dispatcher {
    pub fn new(
        sinks: Vec<Arc<dyn NotificationSink>>,
        template: NotificationTemplate,
        policy: RetryPolicy,
        notify_resolved: bool,
    ) -> Self {
        Self {
            sinks,
            template,
            policy,
            notify_resolved,
            last_delivered: HashMap::new(),
            pending: Vec::new(),
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Result<Self, NotifyError> {
        Ok(Self::new(
            sinks_from_config(config)?,
            NotificationTemplate::from_config(config),
            RetryPolicy::from_config(config),
            config.notify_resolved,
        ))
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Number of notifications waiting for a retry.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn last_delivered(&self, alert: &str) -> Option<AlertState> {
        self.last_delivered.get(alert).copied()
    }

    /// Deliver `events`, after retrying whatever is still pending.
    ///
    /// A new FIRING or RESOLVED event for an alert replaces its pending notification.
    pub async fn dispatch(&mut self, events: &[AlertEvent]) -> DispatchReport {
        let mut report = DispatchReport::default();

        let mut queue = std::mem::take(&mut self.pending);
        for event in events {
            let deliverable = matches!(event.state, AlertState::Firing | AlertState::Resolved);
            if deliverable {
                if let Some(pos) = queue.iter().position(|p| p.notification.alert == event.name) {
                    let old = queue.remove(pos);
                    tracing::info!(
                        alert = %event.name,
                        superseded = %old.notification.state,
                        state = %event.state,
                        "Dropping undelivered notification, superseded"
                    );
                }
            }

            if !self.wants(event) {
                report.suppressed += 1;
                continue;
            }

            queue.push(Pending {
                notification: self.template.render(event),
                remaining: (0..self.sinks.len()).collect(),
            });
        }

        for pending in queue {
            match self.deliver(pending).await {
                None => report.delivered += 1,
                Some(left) => {
                    report.failed += 1;
                    self.pending.push(left);
                }
            }
        }

        report
    }

    fn wants(&self, event: &AlertEvent) -> bool {
        let last = self.last_delivered.get(&event.name).copied();
        match event.state {
            AlertState::Firing => last != Some(AlertState::Firing),
            // Without a delivered FIRING there is nothing to resolve.
            AlertState::Resolved => self.notify_resolved && last == Some(AlertState::Firing),
            AlertState::Ok | AlertState::Pending => false,
        }
    }

    /// Returns the notification back when some sink still failed.
    async fn deliver(&mut self, mut pending: Pending) -> Option<Pending> {
        let mut still_failing = Vec::new();

        for index in pending.remaining.drain(..) {
            let sink = Arc::clone(&self.sinks[index]);
            let notification = &pending.notification;
            let what = format!("{} notification for {}", sink.name(), notification.alert);

            let result = retry(self.policy, &what, || sink.send(notification)).await;
            match result {
                Ok(()) => metrics::record_notification(sink.name(), "delivered"),
                Err(e) => {
                    metrics::record_notification(sink.name(), "failed");
                    tracing::error!(
                        sink = %sink.name(),
                        alert = %notification.alert,
                        state = %notification.state,
                        error = %e,
                        "Notification delivery failed, will retry on next dispatch"
                    );
                    still_failing.push(index);
                }
            }
        }

        if still_failing.is_empty() {
            tracing::info!(
                alert = %pending.notification.alert,
                state = %pending.notification.state,
                "Notification delivered"
            );
            self.last_delivered
                .insert(pending.notification.alert.clone(), pending.notification.state);
            None
        } else {
            pending.remaining = still_failing;
            Some(pending)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, AlertState)>>,
        fail_remaining: AtomicU32,
    }

    #[async_trait]
    impl NotificationSink for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn send(&self, n: &Notification) -> Result<(), NotifyError> {
            if self.fail_remaining.load(Ordering::SeqCst) > 0 {
                self.fail_remaining.fetch_sub(1, Ordering::SeqCst);
                return Err(NotifyError::Status { status: 503, body: "down".to_string() });
            }
            self.sent.lock().unwrap().push((n.alert.clone(), n.state));
            Ok(())
        }
    }

    fn event(state: AlertState, previous: AlertState) -> AlertEvent {
        AlertEvent {
            id: Uuid::new_v4(),
            name: "ModelUnhealthy".to_string(),
            state,
            previous_state: previous,
            timestamp: Utc::now(),
            labels: BTreeMap::from([("alertname".to_string(), "ModelUnhealthy".to_string())]),
            annotations: BTreeMap::new(),
        }
    }

    fn dispatcher(sink: Arc<Recorder>, notify_resolved: bool) -> Dispatcher {
        Dispatcher::new(
            vec![sink as Arc<dyn NotificationSink>],
            NotificationTemplate::from_config(&NotificationConfig::default()),
            RetryPolicy::none(),
            notify_resolved,
        )
    }

    #[tokio::test]
    async fn test_only_firing_and_resolved_delivered() {
        let sink = Arc::new(Recorder::default());
        let mut d = dispatcher(sink.clone(), true);

        let report = d
            .dispatch(&[
                event(AlertState::Pending, AlertState::Ok),
                event(AlertState::Firing, AlertState::Pending),
            ])
            .await;
        assert_eq!(report, DispatchReport { delivered: 1, suppressed: 1, failed: 0 });

        d.dispatch(&[event(AlertState::Resolved, AlertState::Firing)]).await;
        let report = d.dispatch(&[event(AlertState::Ok, AlertState::Resolved)]).await;
        assert_eq!(report.suppressed, 1);

        let sent = sink.sent.lock().unwrap().clone();
        assert_eq!(
            sent.iter().map(|(_, s)| *s).collect::<Vec<_>>(),
            vec![AlertState::Firing, AlertState::Resolved]
        );
    }

    #[tokio::test]
    async fn test_duplicate_firing_suppressed() {
        let sink = Arc::new(Recorder::default());
        let mut d = dispatcher(sink.clone(), true);

        d.dispatch(&[event(AlertState::Firing, AlertState::Pending)]).await;
        let report = d.dispatch(&[event(AlertState::Firing, AlertState::Pending)]).await;

        assert_eq!(report.suppressed, 1);
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resolved_skipped_when_disabled() {
        let sink = Arc::new(Recorder::default());
        let mut d = dispatcher(sink.clone(), false);

        d.dispatch(&[event(AlertState::Firing, AlertState::Pending)]).await;
        let report = d.dispatch(&[event(AlertState::Resolved, AlertState::Firing)]).await;

        assert_eq!(report.suppressed, 1);
        assert_eq!(d.last_delivered("ModelUnhealthy"), Some(AlertState::Firing));
    }

    #[tokio::test]
    async fn test_failed_delivery_requeued_then_sent() {
        let sink = Arc::new(Recorder { fail_remaining: AtomicU32::new(1), ..Default::default() });
        let mut d = dispatcher(sink.clone(), true);

        let report = d.dispatch(&[event(AlertState::Firing, AlertState::Pending)]).await;
        assert_eq!(report.failed, 1);
        assert_eq!(d.pending_len(), 1);

        let report = d.dispatch(&[]).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(d.pending_len(), 0);
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_pending_superseded_by_newer_event() {
        let sink = Arc::new(Recorder { fail_remaining: AtomicU32::new(1), ..Default::default() });
        let mut d = dispatcher(sink.clone(), true);

        d.dispatch(&[event(AlertState::Firing, AlertState::Pending)]).await;
        assert_eq!(d.pending_len(), 1);

        // FIRING never went out, so its RESOLVED is dropped along with it.
        let report = d.dispatch(&[event(AlertState::Resolved, AlertState::Firing)]).await;
        assert_eq!(report, DispatchReport { delivered: 0, suppressed: 1, failed: 0 });
        assert_eq!(d.pending_len(), 0);
        assert!(sink.sent.lock().unwrap().is_empty());
    }
}
