//! Alert events emitted on state transitions.

use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::evaluator::state::AlertState;

/// One alert state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Unique per event; lets receivers drop redelivered copies.
    pub id: Uuid,
    pub name: String,
    pub state: AlertState,
    pub previous_state: AlertState,
    pub timestamp: DateTime<Utc>,
    /// Always contains `alertname`, `severity` and `state`.
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

impl AlertEvent {
    /// Label and annotation values plus event metadata, for templating.
    pub fn template_vars(&self) -> BTreeMap<String, String> {
        let mut vars = self.annotations.clone();
        vars.extend(self.labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        vars.insert("timestamp".to_string(), self.timestamp.to_rfc3339());
        vars.insert("previous_state".to_string(), self.previous_state.to_string());
        vars
    }
}
