//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (threshold in (0, 100], windows > 0)
//! - Check URLs and socket addresses
//! - Detect duplicate alert names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AlerterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::config::schema::{AlerterConfig, MetricSelector};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AlerterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Evaluator
    let tick = config.evaluator.tick_interval;
    non_zero(&mut errors, "evaluator.tick_interval", tick);
    non_zero(&mut errors, "evaluator.fetch_timeout", config.evaluator.fetch_timeout);
    if !tick.is_zero() && config.evaluator.fetch_timeout >= tick {
        errors.push(ValidationError::new(
            "evaluator.fetch_timeout",
            "must be shorter than evaluator.tick_interval",
        ));
    }

    // Thresholds
    let t = &config.thresholds;
    if !t.threshold_low.is_finite() || t.threshold_low <= 0.0 || t.threshold_low > 100.0 {
        errors.push(ValidationError::new(
            "thresholds.threshold_low",
            format!("must be in (0, 100], got {}", t.threshold_low),
        ));
    }
    non_zero(&mut errors, "thresholds.ratio_window", t.ratio_window);
    non_zero(&mut errors, "thresholds.zero_traffic_window", t.zero_traffic_window);

    // Source
    check_http_url(&mut errors, "source.url", &config.source.url);
    check_selector(&mut errors, "source.success", &config.source.success);
    check_selector(&mut errors, "source.total", &config.source.total);

    // Alerts
    let mut seen = HashSet::new();
    for (i, alert) in config.alerts.iter().enumerate() {
        let field = format!("alerts[{}]", i);
        if alert.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("{}.name", field), "must not be empty"));
        } else if !seen.insert(alert.name.as_str()) {
            errors.push(ValidationError::new(
                format!("{}.name", field),
                format!("duplicate alert name {:?}", alert.name),
            ));
        }
        if alert.severity.trim().is_empty() {
            errors.push(ValidationError::new(format!("{}.severity", field), "must not be empty"));
        }
    }

    // Notification
    let n = &config.notification;
    if let Some(webhook_url) = &n.webhook_url {
        check_http_url(&mut errors, "notification.webhook_url", webhook_url);
    }
    if n.recipient.trim().is_empty() {
        errors.push(ValidationError::new("notification.recipient", "must not be empty"));
    }
    if n.max_attempts == 0 {
        errors.push(ValidationError::new("notification.max_attempts", "must be at least 1"));
    }
    if n.base_delay_ms > n.max_delay_ms {
        errors.push(ValidationError::new(
            "notification.base_delay_ms",
            "must not exceed notification.max_delay_ms",
        ));
    }
    non_zero(&mut errors, "notification.timeout", n.timeout);

    // Status / observability
    if config.status.enabled {
        check_socket_addr(&mut errors, "status.bind_address", &config.status.bind_address);
    }
    if config.observability.metrics_enabled {
        check_socket_addr(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn non_zero(errors: &mut Vec<ValidationError>, field: &str, value: Duration) {
    if value.is_zero() {
        errors.push(ValidationError::new(field, "must be greater than zero"));
    }
}

fn check_http_url(errors: &mut Vec<ValidationError>, field: &str, raw: &str) {
    match url::Url::parse(raw) {
        Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
        Ok(u) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme {:?}", u.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &str, raw: &str) {
    if raw.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("invalid socket address {:?}", raw)));
    }
}

fn check_selector(errors: &mut Vec<ValidationError>, field: &str, selector: &MetricSelector) {
    if selector.metric.trim().is_empty() {
        errors.push(ValidationError::new(format!("{}.metric", field), "must not be empty"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{AlertConfig, ConditionKind};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AlerterConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AlerterConfig::default();
        config.thresholds.threshold_low = 0.0;
        config.thresholds.ratio_window = Duration::ZERO;
        config.source.url = "not a url".to_string();
        config.notification.max_attempts = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"thresholds.threshold_low"));
        assert!(fields.contains(&"thresholds.ratio_window"));
        assert!(fields.contains(&"source.url"));
        assert!(fields.contains(&"notification.max_attempts"));
    }

    #[test]
    fn test_timeout_must_fit_in_tick() {
        let mut config = AlerterConfig::default();
        config.evaluator.tick_interval = Duration::from_secs(5);
        config.evaluator.fetch_timeout = Duration::from_secs(5);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "evaluator.fetch_timeout");
    }

    #[test]
    fn test_duplicate_alert_names() {
        let mut config = AlerterConfig::default();
        config.alerts = vec![AlertConfig::model_unhealthy(), AlertConfig::model_unhealthy()];
        config.alerts[1].condition = ConditionKind::ZeroTraffic;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].message.contains("duplicate"));
    }

    #[test]
    fn test_rejects_non_http_webhook() {
        let mut config = AlerterConfig::default();
        config.notification.webhook_url = Some("ftp://example.com/hook".to_string());
        assert!(validate_config(&config).is_err());
    }
}
