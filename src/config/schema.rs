//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the alerter.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::config::duration;

/// Root configuration for the alerter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AlerterConfig {
    /// Evaluation loop settings.
    pub evaluator: EvaluatorConfig,

    /// Alert thresholds and windows.
    pub thresholds: ThresholdConfig,

    /// Counter source (metrics endpoint) settings.
    pub source: SourceConfig,

    /// Alert definitions. Empty means the built-in `ModelUnhealthy` alert.
    pub alerts: Vec<AlertConfig>,

    /// Notification settings.
    pub notification: NotificationConfig,

    /// Status endpoint settings.
    pub status: StatusConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Evaluation loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Interval between ticks.
    #[serde(with = "duration")]
    pub tick_interval: Duration,

    /// Deadline for a single counter fetch.
    #[serde(with = "duration")]
    pub fetch_timeout: Duration,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            fetch_timeout: Duration::from_secs(5),
        }
    }
}

/// Thresholds shared by the built-in conditions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Success percentage below which `LowSuccessRatio` holds.
    pub threshold_low: f64,

    /// Window for the success ratio.
    #[serde(with = "duration")]
    pub ratio_window: Duration,

    /// Window over which zero traffic must be observed.
    #[serde(with = "duration")]
    pub zero_traffic_window: Duration,

    /// How long a condition must hold before the alert fires.
    #[serde(with = "duration")]
    pub for_duration: Duration,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            threshold_low: 20.0,
            ratio_window: Duration::from_secs(600),
            zero_traffic_window: Duration::from_secs(600),
            for_duration: Duration::from_secs(300),
        }
    }
}

/// Selects the series of one counter from a scrape.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MetricSelector {
    /// Metric name (e.g., "model_requests_total").
    pub metric: String,

    /// Exact-match label filters. Matching series are summed.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Counter source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Source identifier for logging/metrics.
    pub name: String,

    /// Metrics endpoint in Prometheus text exposition format.
    pub url: String,

    /// Selector for the successful-request counter.
    pub success: MetricSelector,

    /// Selector for the total-request counter.
    pub total: MetricSelector,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: "model".to_string(),
            url: "http://127.0.0.1:9100/metrics".to_string(),
            success: MetricSelector {
                metric: "model_requests_total".to_string(),
                labels: BTreeMap::from([("outcome".to_string(), "success".to_string())]),
            },
            total: MetricSelector {
                metric: "model_requests_total".to_string(),
                labels: BTreeMap::new(),
            },
        }
    }
}

/// Which predicate an alert evaluates.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// Success ratio below `threshold_low`.
    LowSuccessRatio,
    /// No requests over the zero-traffic window.
    ZeroTraffic,
    /// Either of the above.
    Any,
}

/// A configured alert definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertConfig {
    /// Unique alert name.
    pub name: String,

    /// Predicate to evaluate.
    pub condition: ConditionKind,

    /// Severity label (e.g., "critical", "warning").
    #[serde(default = "default_severity")]
    pub severity: String,

    /// Per-alert override of `thresholds.for_duration`.
    #[serde(default, with = "optional_duration")]
    pub for_duration: Option<Duration>,

    /// Static labels attached to every event.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Free-form annotations (summary, runbook, ...).
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

fn default_severity() -> String {
    "critical".to_string()
}

impl AlertConfig {
    /// The alert used when no `[[alerts]]` are configured.
    pub fn model_unhealthy() -> Self {
        Self {
            name: "ModelUnhealthy".to_string(),
            condition: ConditionKind::Any,
            severity: default_severity(),
            for_duration: None,
            labels: BTreeMap::new(),
            annotations: BTreeMap::from([(
                "summary".to_string(),
                "Model success ratio is low or it has stopped receiving traffic".to_string(),
            )]),
        }
    }
}

/// Notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Recipient template (e.g., an email address or channel).
    pub recipient: String,

    /// Subject template.
    pub subject: String,

    /// Body template.
    pub body: String,

    /// Webhook endpoint. Without it notifications go to the log sink.
    pub webhook_url: Option<String>,

    /// Per-request timeout for the webhook.
    #[serde(with = "duration")]
    pub timeout: Duration,

    /// Delivery attempts per sink before giving up for this dispatch.
    pub max_attempts: u32,

    /// Base delay for exponential backoff.
    pub base_delay_ms: u64,

    /// Maximum backoff delay.
    pub max_delay_ms: u64,

    /// Deliver RESOLVED transitions as well as FIRING ones.
    pub notify_resolved: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            recipient: "oncall@example.com".to_string(),
            subject: "[{{state}}] {{alertname}} ({{severity}})".to_string(),
            body: "Alert {{alertname}} is {{state}} since {{timestamp}}.\n{{summary}}".to_string(),
            webhook_url: None,
            timeout: Duration::from_secs(10),
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 5000,
            notify_resolved: true,
        }
    }
}

/// Status endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Serve the status endpoint.
    pub enabled: bool,

    /// Bind address.
    pub bind_address: String,

    /// Optional API key (Bearer token). No key means no auth.
    pub api_key: Option<String>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8081".to_string(),
            api_key: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9091".to_string(),
        }
    }
}

impl AlerterConfig {
    /// Configured alerts, or the built-in default when none are given.
    pub fn effective_alerts(&self) -> Vec<AlertConfig> {
        if self.alerts.is_empty() {
            vec![AlertConfig::model_unhealthy()]
        } else {
            self.alerts.clone()
        }
    }
}

mod optional_duration {
    use std::time::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::config::duration::{format_duration, parse_duration};

    pub fn serialize<S: Serializer>(d: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => serializer.serialize_some(&format_duration(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse_duration(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
