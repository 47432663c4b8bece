//! Configuration loading from disk.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::AlerterConfig;
use crate::config::template;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unresolved placeholders: {}", .0.join(", "))]
    Unresolved(Vec<String>),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// `${NAME}` placeholders are resolved against `env` before parsing.
pub fn load_config(path: &Path, env: &HashMap<String, String>) -> Result<AlerterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, env)
}

/// Resolve, parse and validate configuration text.
pub fn parse_config(content: &str, env: &HashMap<String, String>) -> Result<AlerterConfig, ConfigError> {
    let rendered = template::render(content, env).map_err(ConfigError::Unresolved)?;
    let config: AlerterConfig = toml::from_str(&rendered)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_resolved_before_parse() {
        let env = HashMap::from([
            ("METRICS_URL".to_string(), "http://model:8000/metrics".to_string()),
            ("ONCALL".to_string(), "sre@example.com".to_string()),
        ]);
        let config = parse_config(
            r#"
            [source]
            url = "${METRICS_URL}"

            [notification]
            recipient = "${ONCALL}"
            "#,
            &env,
        )
        .unwrap();

        assert_eq!(config.source.url, "http://model:8000/metrics");
        assert_eq!(config.notification.recipient, "sre@example.com");
    }

    #[test]
    fn test_unresolved_placeholder_is_fatal() {
        let err = parse_config("[source]\nurl = \"${MISSING_URL}\"\n", &HashMap::new()).unwrap_err();
        match err {
            ConfigError::Unresolved(names) => assert_eq!(names, vec!["MISSING_URL".to_string()]),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_validation_errors_surface() {
        let err = parse_config("[thresholds]\nthreshold_low = 150\n", &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("thresholds.threshold_low"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/alerter.toml"), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
