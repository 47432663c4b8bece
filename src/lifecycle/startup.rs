//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order from a validated config
//! - Bind the status listener before the first tick
//! - Run until a signal arrives, then shut down within a deadline

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use axum::Router;
use futures_util::future::join_all;
use tokio::net::TcpListener;

use crate::config::AlerterConfig;
use crate::error::{Error, Result};
use crate::evaluator::{definitions_from_config, EvaluationLoop, HealthEvaluator, StatusHandle};
use crate::lifecycle::{signals, Shutdown};
use crate::notify::Dispatcher;
use crate::observability::metrics;
use crate::source::ScrapeSource;
use crate::status;

/// How long tasks get to finish after shutdown is triggered.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// A fully wired alerter that has not started running yet.
pub struct Alerter {
    pub evaluation: EvaluationLoop,
    pub status: StatusHandle,
    /// Bound status listener and its router, when the endpoint is enabled.
    pub status_server: Option<(TcpListener, Router)>,
}

impl Alerter {
    /// Address the status API is bound to.
    pub fn status_addr(&self) -> Option<SocketAddr> {
        self.status_server
            .as_ref()
            .and_then(|(listener, _)| listener.local_addr().ok())
    }

    /// Spawn every task and run until `shutdown` fires.
    pub async fn run_until(self, shutdown: &Shutdown) {
        let mut stop = shutdown.subscribe();
        let mut tasks = Vec::new();

        if let Some((listener, router)) = self.status_server {
            let rx = shutdown.subscribe();
            tasks.push(tokio::spawn(async move {
                if let Err(e) = status::serve(listener, router, rx).await {
                    tracing::error!(error = %e, "Status API failed");
                }
            }));
        }

        let rx = shutdown.subscribe();
        let evaluation = self.evaluation;
        tasks.push(tokio::spawn(evaluation.run(rx)));

        let _ = stop.recv().await;
        drain(tasks).await;
    }
}

/// Build every component from `config`. Nothing runs until [`Alerter::run_until`].
pub async fn build(config: &AlerterConfig) -> Result<Alerter> {
    if config.observability.metrics_enabled {
        let addr = parse_addr(&config.observability.metrics_address)?;
        metrics::init_metrics(addr).map_err(|e| Error::Startup(format!("metrics exporter: {}", e)))?;
    }

    let definitions = definitions_from_config(config);
    for definition in &definitions {
        tracing::info!(
            alert = %definition.name,
            condition = %definition.condition.name(),
            severity = %definition.severity,
            for_duration = ?definition.for_duration,
            "Alert loaded"
        );
    }
    let evaluator = HealthEvaluator::new(definitions);

    let source = ScrapeSource::new(&config.source, config.evaluator.fetch_timeout)
        .map_err(|e| Error::Startup(format!("counter source: {}", e)))?;

    let dispatcher = Dispatcher::from_config(&config.notification)?;
    tracing::info!(sinks = ?dispatcher.sink_names(), "Notification sinks ready");

    let status = StatusHandle::new();

    let status_server = if config.status.enabled {
        let addr = parse_addr(&config.status.bind_address)?;
        let listener = TcpListener::bind(addr).await?;
        let router = status::status_router(status.clone(), config.status.api_key.clone());
        Some((listener, router))
    } else {
        None
    };

    let evaluation = EvaluationLoop::new(
        evaluator,
        Arc::new(source),
        dispatcher,
        config.evaluator.clone(),
        status.clone(),
    );

    Ok(Alerter {
        evaluation,
        status,
        status_server,
    })
}

/// Build, run, and stop on SIGINT/SIGTERM.
pub async fn run(config: AlerterConfig) -> Result<()> {
    let alerter = build(&config).await?;
    let shutdown = Shutdown::new();

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signals::wait_for_signal().await {
            tracing::error!(error = %e, "Signal handler failed, shutting down");
        }
        signal_shutdown.trigger();
    });

    alerter.run_until(&shutdown).await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn drain(tasks: Vec<tokio::task::JoinHandle<()>>) {
    match tokio::time::timeout(SHUTDOWN_GRACE, join_all(tasks)).await {
        Ok(results) => {
            for result in results {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Task ended abnormally");
                }
            }
        }
        Err(_) => tracing::warn!(grace = ?SHUTDOWN_GRACE, "Tasks did not stop in time, abandoning them"),
    }
}

fn parse_addr(value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|e| Error::Startup(format!("invalid address {}: {}", value, e)))
}
