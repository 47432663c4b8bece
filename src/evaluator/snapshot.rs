//! Read-only status snapshots shared with the status endpoint.

use std::collections::BTreeMap;
use std::sync::Arc;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::evaluator::state::{AlertState, AlertStatus};

/// One alert as seen by status readers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertView {
    pub state: AlertState,
    pub severity: String,
    pub since: DateTime<Utc>,
    pub active_since: Option<DateTime<Utc>>,
    pub last_evaluated: DateTime<Utc>,
    pub last_value: Option<f64>,
}

impl AlertView {
    pub fn new(status: &AlertStatus, severity: &str) -> Self {
        Self {
            state: status.state,
            severity: severity.to_string(),
            since: status.since,
            active_since: status.active_since,
            last_evaluated: status.last_evaluated,
            last_value: status.last_value,
        }
    }
}

/// Last-known alert states plus loop health.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    pub alerts: BTreeMap<String, AlertView>,
    /// True when the most recent tick could not fetch data.
    pub stale: bool,
    pub last_tick: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub ticks_total: u64,
    pub failed_ticks_total: u64,
}

/// Shared handle: the loop publishes, readers load a copy.
#[derive(Clone, Default)]
pub struct StatusHandle {
    inner: Arc<ArcSwap<StatusSnapshot>>,
}

impl StatusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> Arc<StatusSnapshot> {
        self.inner.load_full()
    }

    pub fn publish(&self, snapshot: StatusSnapshot) {
        self.inner.store(Arc::new(snapshot));
    }
}
