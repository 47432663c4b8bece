//! Alert definitions built from configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::{AlertConfig, AlerterConfig, ThresholdConfig};
use crate::evaluator::condition::Condition;

/// Immutable description of one alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDefinition {
    pub name: String,
    pub condition: Condition,
    pub for_duration: Duration,
    pub severity: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

impl AlertDefinition {
    pub fn from_config(alert: &AlertConfig, thresholds: &ThresholdConfig) -> Self {
        Self {
            name: alert.name.clone(),
            condition: Condition::from_kind(alert.condition, thresholds),
            for_duration: alert.for_duration.unwrap_or(thresholds.for_duration),
            severity: alert.severity.clone(),
            labels: alert.labels.clone(),
            annotations: alert.annotations.clone(),
        }
    }
}

/// All definitions for a configuration, in declaration order.
pub fn definitions_from_config(config: &AlerterConfig) -> Vec<AlertDefinition> {
    config
        .effective_alerts()
        .iter()
        .map(|alert| AlertDefinition::from_config(alert, &config.thresholds))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConditionKind;

    #[test]
    fn test_default_definition() {
        let defs = definitions_from_config(&AlerterConfig::default());
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "ModelUnhealthy");
        assert_eq!(defs[0].for_duration, Duration::from_secs(300));
        assert!(matches!(defs[0].condition, Condition::Any(ref inner) if inner.len() == 2));
    }

    #[test]
    fn test_per_alert_for_duration_override() {
        let mut config = AlerterConfig::default();
        let mut alert = AlertConfig::model_unhealthy();
        alert.name = "NoTraffic".to_string();
        alert.condition = ConditionKind::ZeroTraffic;
        alert.for_duration = Some(Duration::from_secs(60));
        config.alerts.push(alert);

        let defs = definitions_from_config(&config);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].for_duration, Duration::from_secs(60));
        assert_eq!(defs[0].condition.name(), "zero_traffic");
    }
}
