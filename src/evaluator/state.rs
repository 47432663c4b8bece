//! Per-alert state machine.
//!
//! # State Transitions
//! ```text
//! OK / RESOLVED → PENDING: condition holds (FIRING directly if for_duration is 0)
//! PENDING → FIRING: condition held continuously for for_duration
//! PENDING → OK: condition clears
//! FIRING → RESOLVED: condition clears
//! RESOLVED → OK: condition still clear on the next evaluation
//! ```
//!
//! # Design Decisions
//! - Hysteresis prevents flapping: FIRING needs a continuous run of true evaluations
//! - No partial credit: a single false evaluation restarts the run

use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertState {
    Ok,
    Pending,
    Firing,
    Resolved,
}

impl AlertState {
    /// Numeric encoding for gauges (0=OK, 1=PENDING, 2=FIRING, 3=RESOLVED).
    pub fn as_gauge(&self) -> f64 {
        match self {
            AlertState::Ok => 0.0,
            AlertState::Pending => 1.0,
            AlertState::Firing => 2.0,
            AlertState::Resolved => 3.0,
        }
    }
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertState::Ok => "OK",
            AlertState::Pending => "PENDING",
            AlertState::Firing => "FIRING",
            AlertState::Resolved => "RESOLVED",
        };
        f.write_str(s)
    }
}

/// A state change produced by [`AlertStatus::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: AlertState,
    pub to: AlertState,
}

/// In-memory status of one alert definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertStatus {
    pub state: AlertState,
    /// When the current state was entered.
    pub since: DateTime<Utc>,
    /// Start of the current uninterrupted run of true evaluations.
    pub active_since: Option<DateTime<Utc>>,
    pub last_evaluated: DateTime<Utc>,
    /// Value reported by the condition on the last true evaluation.
    pub last_value: Option<f64>,
}

impl AlertStatus {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: AlertState::Ok,
            since: now,
            active_since: None,
            last_evaluated: now,
            last_value: None,
        }
    }

    /// Feed one evaluation result. Returns the transition, if any.
    pub fn advance(
        &mut self,
        holds: bool,
        value: Option<f64>,
        for_duration: chrono::Duration,
        now: DateTime<Utc>,
    ) -> Option<Transition> {
        self.last_evaluated = now;

        let next = if holds {
            self.last_value = value;
            let active_since = *self.active_since.get_or_insert(now);
            match self.state {
                AlertState::Ok | AlertState::Resolved if for_duration <= chrono::Duration::zero() => AlertState::Firing,
                AlertState::Ok | AlertState::Resolved => AlertState::Pending,
                AlertState::Pending if now - active_since >= for_duration => AlertState::Firing,
                AlertState::Pending => AlertState::Pending,
                AlertState::Firing => AlertState::Firing,
            }
        } else {
            self.active_since = None;
            self.last_value = None;
            match self.state {
                AlertState::Firing => AlertState::Resolved,
                AlertState::Ok | AlertState::Pending | AlertState::Resolved => AlertState::Ok,
            }
        };

        if next == self.state {
            return None;
        }

        let transition = Transition {
            from: self.state,
            to: next,
        };
        self.state = next;
        self.since = now;
        Some(transition)
    }
}
