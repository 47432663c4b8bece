use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use crate::evaluator::condition::Verdict;
use crate::evaluator::definition::AlertDefinition;
use crate::evaluator::event::AlertEvent;
use crate::evaluator::sample::{to_chrono, Accepted, Sample, SampleHistory};
use crate::evaluator::state::{AlertStatus, Transition};

/// Evaluates alert definitions against one counter stream.
pub struct HealthEvaluator {
    definitions: Vec<AlertDefinition>,
    history: SampleHistory,
    states: BTreeMap<String, AlertStatus>,
}

impl HealthEvaluator {
    pub fn new(definitions: Vec<AlertDefinition>) -> Self {
        let retention = definitions
            .iter()
            .map(|d| d.condition.max_window())
            .max()
            .unwrap_or(Duration::ZERO);

        Self {
            definitions,
            history: SampleHistory::new(retention),
            states: BTreeMap::new(),
        }
    }

    pub fn definitions(&self) -> &[AlertDefinition] {
        &self.definitions
    }

    /// Current status per alert name. Empty until the first evaluation.
    pub fn states(&self) -> &BTreeMap<String, AlertStatus> {
        &self.states
    }

    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    /// Add a sample to the history. Returns false if it was dropped.
    pub fn ingest(&mut self, sample: Sample) -> bool {
        match self.history.push(sample) {
            Ok(Accepted::Appended) => true,
            Ok(Accepted::Reset) => {
                tracing::info!(
                    timestamp = %sample.timestamp,
                    total_count = sample.total_count,
                    "Counter decreased, source restarted; counting from zero"
                );
                true
            }
            Err(reason) => {
                tracing::warn!(
                    timestamp = %sample.timestamp,
                    successful_count = sample.successful_count,
                    total_count = sample.total_count,
                    %reason,
                    "Sample dropped"
                );
                false
            }
        }
    }

    /// Evaluate every definition at the latest sample's timestamp.
    ///
    /// Returns one event per state transition.
    pub fn evaluate(&mut self) -> Vec<AlertEvent> {
        let Some(now) = self.history.latest().map(|s| s.timestamp) else {
            return Vec::new();
        };

        let mut events = Vec::new();
        for definition in &self.definitions {
            let verdict = definition.condition.evaluate(&self.history);
            let status = self
                .states
                .entry(definition.name.clone())
                .or_insert_with(|| AlertStatus::new(now));

            let (holds, value, condition) = match verdict {
                Verdict::Holds { condition, value } => (true, Some(value), Some(condition)),
                Verdict::Clear => (false, None, None),
                Verdict::InsufficientData => {
                    tracing::debug!(alert = %definition.name, "Insufficient data, treating condition as clear");
                    (false, None, None)
                }
                Verdict::DataGap => {
                    tracing::debug!(
                        alert = %definition.name,
                        state = %status.state,
                        "No samples inside the window after a gap, holding state"
                    );
                    continue;
                }
            };

            if let Some(transition) = status.advance(holds, value, to_chrono(definition.for_duration), now) {
                tracing::info!(
                    alert = %definition.name,
                    from = %transition.from,
                    to = %transition.to,
                    "Alert state changed"
                );
                events.push(build_event(definition, transition, now, value, condition));
            }
        }

        events
    }

    /// Ingest then evaluate. A dropped sample triggers no evaluation.
    pub fn observe(&mut self, sample: Sample) -> Vec<AlertEvent> {
        if self.ingest(sample) {
            self.evaluate()
        } else {
            Vec::new()
        }
    }
}

fn build_event(
    definition: &AlertDefinition,
    transition: Transition,
    now: chrono::DateTime<chrono::Utc>,
    value: Option<f64>,
    condition: Option<&'static str>,
) -> AlertEvent {
    let mut labels = definition.labels.clone();
    labels.insert("alertname".to_string(), definition.name.clone());
    labels.insert("severity".to_string(), definition.severity.clone());
    labels.insert("state".to_string(), transition.to.to_string());
    if let Some(value) = value {
        labels.insert("value".to_string(), format!("{:.2}", value));
    }
    if let Some(condition) = condition {
        labels.insert("condition".to_string(), condition.to_string());
    }

    AlertEvent {
        id: Uuid::new_v4(),
        name: definition.name.clone(),
        state: transition.to,
        previous_state: transition.from,
        timestamp: now,
        labels,
        annotations: definition.annotations.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlerterConfig;
    use crate::evaluator::definition::definitions_from_config;
    use crate::evaluator::state::AlertState;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minute)
    }

    fn evaluator() -> HealthEvaluator {
        HealthEvaluator::new(definitions_from_config(&AlerterConfig::default()))
    }

    fn states_of(events: &[AlertEvent]) -> Vec<AlertState> {
        events.iter().map(|e| e.state).collect()
    }

    #[test]
    fn test_low_ratio_fires_exactly_once() {
        let mut ev = evaluator();
        let mut seen = Vec::new();

        // 10% success every minute
        for minute in 0..=12 {
            let total = 100 * minute as u64;
            seen.extend(ev.observe(Sample::new(at(minute), total / 10, total)));
        }

        assert_eq!(states_of(&seen), vec![AlertState::Pending, AlertState::Firing]);
        // pending at minute 1 (first measurable window), firing 5 minutes later
        assert_eq!(seen[0].timestamp, at(1));
        assert_eq!(seen[1].timestamp, at(6));
        assert_eq!(seen[1].labels.get("condition").map(String::as_str), Some("low_success_ratio"));
        assert_eq!(seen[1].labels.get("value").map(String::as_str), Some("10.00"));
    }

    #[test]
    fn test_replaying_samples_is_idempotent() {
        let mut ev = evaluator();
        let samples: Vec<Sample> = (0..=8)
            .map(|minute| Sample::new(at(minute), 0, 0))
            .collect();

        let first: Vec<_> = samples.iter().flat_map(|s| ev.observe(*s)).collect();
        assert_eq!(states_of(&first), vec![AlertState::Pending, AlertState::Firing]);

        let replay: Vec<_> = samples.iter().flat_map(|s| ev.observe(*s)).collect();
        assert!(replay.is_empty());
        assert!(ev.evaluate().is_empty());
        assert_eq!(ev.states()["ModelUnhealthy"].state, AlertState::Firing);
    }

    #[test]
    fn test_recovery_resolves() {
        let mut ev = evaluator();
        for minute in 0..=6 {
            ev.observe(Sample::new(at(minute), 0, 0));
        }
        assert_eq!(ev.states()["ModelUnhealthy"].state, AlertState::Firing);

        // healthy traffic resumes
        let events = ev.observe(Sample::new(at(7), 95, 100));
        assert_eq!(states_of(&events), vec![AlertState::Resolved]);
        assert_eq!(events[0].previous_state, AlertState::Firing);

        let events = ev.observe(Sample::new(at(8), 190, 200));
        assert_eq!(states_of(&events), vec![AlertState::Ok]);
    }

    #[test]
    fn test_restart_at_same_ratio_stays_firing() {
        let mut ev = evaluator();
        let mut seen = Vec::new();
        for minute in 0..=7 {
            seen.extend(ev.observe(Sample::new(at(minute), 10 * minute as u64, 100 * minute as u64)));
        }
        assert_eq!(states_of(&seen), vec![AlertState::Pending, AlertState::Firing]);

        // process restarts and keeps failing 90% of requests
        assert!(ev.observe(Sample::new(at(8), 1, 10)).is_empty());
        assert!(ev.observe(Sample::new(at(9), 11, 110)).is_empty());
        assert_eq!(ev.states()["ModelUnhealthy"].state, AlertState::Firing);
        assert_eq!(ev.history().latest().unwrap().total_count, 810);
    }

    #[test]
    fn test_restart_with_healthy_traffic_resolves() {
        let mut ev = evaluator();
        for minute in 0..=7 {
            ev.observe(Sample::new(at(minute), 10 * minute as u64, 100 * minute as u64));
        }
        assert_eq!(ev.states()["ModelUnhealthy"].state, AlertState::Firing);

        assert!(ev.observe(Sample::new(at(8), 1, 10)).is_empty());
        // 300 of 300 requests since the restart succeed
        let events = ev.observe(Sample::new(at(9), 301, 310));
        assert_eq!(states_of(&events), vec![AlertState::Resolved]);
    }

    #[test]
    fn test_gap_longer_than_window_holds_state() {
        let mut ev = evaluator();
        for minute in 0..=7 {
            ev.observe(Sample::new(at(minute), 10 * minute as u64, 100 * minute as u64));
        }
        assert_eq!(ev.states()["ModelUnhealthy"].state, AlertState::Firing);

        // nothing between minute 7 and minute 19
        assert!(ev.observe(Sample::new(at(19), 190, 1900)).is_empty());
        assert_eq!(ev.states()["ModelUnhealthy"].state, AlertState::Firing);

        // the window fills again and decides
        assert!(ev.observe(Sample::new(at(20), 200, 2000)).is_empty());
        let events = ev.observe(Sample::new(at(21), 1100, 3000));
        assert_eq!(states_of(&events), vec![AlertState::Resolved]);
    }

    #[test]
    fn test_dropped_sample_does_not_evaluate() {
        let mut ev = evaluator();
        ev.observe(Sample::new(at(0), 0, 0));
        ev.observe(Sample::new(at(1), 0, 0));
        let before = ev.states().clone();

        assert!(ev.observe(Sample::new(at(1), 0, 0)).is_empty());
        assert!(ev.observe(Sample::new(at(2), 5, 1)).is_empty());
        assert_eq!(ev.states(), &before);
    }

    #[test]
    fn test_no_state_before_first_sample() {
        let mut ev = evaluator();
        assert!(ev.evaluate().is_empty());
        assert!(ev.states().is_empty());

        // one sample is insufficient: state exists and is OK
        ev.observe(Sample::new(at(0), 0, 0));
        assert_eq!(ev.states()["ModelUnhealthy"].state, AlertState::Ok);
    }
}
