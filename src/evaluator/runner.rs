//! The evaluation loop.
//!
//! # Responsibilities
//! - Tick on a fixed interval; ticks never overlap
//! - Fetch one sample per tick under a deadline
//! - Evaluate, dispatch transitions, publish a status snapshot

use std::sync::Arc;
use std::time::Instant;
use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::EvaluatorConfig;
use crate::error::Error;
use crate::evaluator::engine::HealthEvaluator;
use crate::evaluator::snapshot::{AlertView, StatusHandle, StatusSnapshot};
use crate::notify::Dispatcher;
use crate::observability::metrics;
use crate::source::{CounterSource, SourceError};

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Sample accepted and evaluated.
    Evaluated { transitions: usize },
    /// Sample fetched but rejected by the history.
    SampleDropped,
    /// Fetch failed or timed out; states left untouched.
    Stale,
}

pub struct EvaluationLoop {
    evaluator: HealthEvaluator,
    source: Arc<dyn CounterSource>,
    dispatcher: Dispatcher,
    config: EvaluatorConfig,
    status: StatusHandle,
    snapshot: StatusSnapshot,
}

impl EvaluationLoop {
    pub fn new(
        evaluator: HealthEvaluator,
        source: Arc<dyn CounterSource>,
        dispatcher: Dispatcher,
        config: EvaluatorConfig,
        status: StatusHandle,
    ) -> Self {
        Self {
            evaluator,
            source,
            dispatcher,
            config,
            status,
            snapshot: StatusSnapshot::default(),
        }
    }

    pub fn status(&self) -> StatusHandle {
        self.status.clone()
    }

    pub fn evaluator(&self) -> &HealthEvaluator {
        &self.evaluator
    }

    /// Run until the shutdown signal fires.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            source = %self.source.name(),
            tick_interval = ?self.config.tick_interval,
            fetch_timeout = ?self.config.fetch_timeout,
            alerts = self.evaluator.definitions().len(),
            "Evaluation loop starting"
        );

        let mut ticker = time::interval(self.config.tick_interval);
        // An overrun tick is skipped, never queued.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Evaluation loop received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Execute one tick: fetch → evaluate → dispatch → publish.
    pub async fn tick(&mut self) -> TickOutcome {
        let now = Utc::now();
        self.snapshot.ticks_total += 1;
        self.snapshot.last_tick = Some(now);

        let started = Instant::now();
        let fetched = match time::timeout(self.config.fetch_timeout, self.source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.config.fetch_timeout)),
        };
        metrics::record_fetch_duration(started);

        let sample = match fetched {
            Ok(sample) => sample,
            Err(e) => {
                let err = Error::DataUnavailable(e);
                tracing::warn!(source = %self.source.name(), error = %err, "Tick abandoned, alert states unchanged");
                metrics::record_tick("stale");
                self.snapshot.stale = true;
                self.snapshot.failed_ticks_total += 1;
                self.snapshot.last_error = Some(err.to_string());
                self.publish();
                return TickOutcome::Stale;
            }
        };

        self.snapshot.stale = false;
        self.snapshot.last_success = Some(now);
        self.snapshot.last_error = None;

        if !self.evaluator.ingest(sample) {
            metrics::record_tick("dropped");
            self.publish();
            return TickOutcome::SampleDropped;
        }

        let events = self.evaluator.evaluate();
        let transitions = events.len();
        if !events.is_empty() {
            let report = self.dispatcher.dispatch(&events).await;
            tracing::debug!(
                delivered = report.delivered,
                suppressed = report.suppressed,
                failed = report.failed,
                "Dispatch complete"
            );
        }

        metrics::record_tick("evaluated");
        self.publish();
        TickOutcome::Evaluated { transitions }
    }

    fn publish(&mut self) {
        let severities = self
            .evaluator
            .definitions()
            .iter()
            .map(|d| (d.name.as_str(), d.severity.as_str()))
            .collect::<std::collections::HashMap<_, _>>();

        self.snapshot.alerts = self
            .evaluator
            .states()
            .iter()
            .map(|(name, status)| {
                metrics::record_alert_state(name, status.state);
                let severity = severities.get(name.as_str()).copied().unwrap_or("unknown");
                (name.clone(), AlertView::new(status, severity))
            })
            .collect();

        self.status.publish(self.snapshot.clone());
    }
}
