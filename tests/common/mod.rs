//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use health_alerter::config::{AlertConfig, ConditionKind, NotificationConfig, ThresholdConfig};
use health_alerter::evaluator::{AlertDefinition, Sample};
use health_alerter::notify::{Notification, NotificationSink, NotifyError};
use health_alerter::source::{CounterSource, SourceError};

/// Fixed epoch so sample timestamps are readable as offsets.
pub fn t(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}

pub fn sample(minutes: i64, successful: u64, total: u64) -> Sample {
    Sample::new(t(minutes), successful, total)
}

/// The default `ModelUnhealthy` alert with a custom hold time.
pub fn model_unhealthy(for_minutes: u64) -> Vec<AlertDefinition> {
    let alert = AlertConfig {
        condition: ConditionKind::Any,
        for_duration: Some(Duration::from_secs(for_minutes * 60)),
        ..AlertConfig::model_unhealthy()
    };
    vec![AlertDefinition::from_config(&alert, &ThresholdConfig::default())]
}

/// Serves a programmable HTTP response on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: text/plain; version=0.0.4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Exposition text for the default selectors.
pub fn exposition(successful: u64, failed: u64) -> String {
    format!(
        "# TYPE model_requests_total counter\n\
         model_requests_total{{outcome=\"success\"}} {}\n\
         model_requests_total{{outcome=\"error\"}} {}\n",
        successful, failed
    )
}

/// One scripted fetch.
pub enum Step {
    Sample(Sample),
    Fail(SourceError),
    /// Never answers; the loop's deadline has to cut it off.
    Hang,
}

/// Source that replays a script; an exhausted script fails every fetch.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Step>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Step>) -> Self {
        Self { script: Mutex::new(script.into()) }
    }

    pub fn push(&self, step: Step) {
        self.script.lock().unwrap().push_back(step);
    }
}

#[async_trait]
impl CounterSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self) -> Result<Sample, SourceError> {
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Sample(sample)) => Ok(sample),
            Some(Step::Fail(e)) => Err(e),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(SourceError::Status(504))
            }
            None => Err(SourceError::Status(503)),
        }
    }
}

/// Sink that records every notification it accepts.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub fn notification_config() -> NotificationConfig {
    NotificationConfig {
        max_attempts: 1,
        base_delay_ms: 1,
        max_delay_ms: 1,
        ..Default::default()
    }
}

pub fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}
