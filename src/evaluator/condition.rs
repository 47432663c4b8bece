//! Alert conditions.
//!
//! `LowSuccessRatio` and `ZeroTraffic` are separate predicates. `Any` joins
//! them with a logical OR so an undefined ratio during an outage can never
//! hide the zero-traffic signal.

use std::time::Duration;

use crate::config::{ConditionKind, ThresholdConfig};
use crate::evaluator::sample::SampleHistory;
use crate::evaluator::window::RateWindow;

/// A predicate over the sample history.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `total_rate > 0 && success_ratio * 100 < threshold_low`.
    LowSuccessRatio { threshold_low: f64, window: Duration },
    /// `total_rate == 0` over the window.
    ZeroTraffic { window: Duration },
    /// Holds if any inner condition holds.
    Any(Vec<Condition>),
}

/// Result of evaluating a condition once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// The condition holds. `value` is the observed quantity.
    Holds { condition: &'static str, value: f64 },
    Clear,
    /// Not enough samples to decide. Treated as clear.
    InsufficientData,
    /// Samples stopped for longer than the window. The alert keeps its state.
    DataGap,
}

impl Verdict {
    pub fn holds(&self) -> bool {
        matches!(self, Verdict::Holds { .. })
    }
}

impl Condition {
    /// Build the condition for a configured kind.
    pub fn from_kind(kind: ConditionKind, thresholds: &ThresholdConfig) -> Self {
        let low_ratio = Condition::LowSuccessRatio {
            threshold_low: thresholds.threshold_low,
            window: thresholds.ratio_window,
        };
        let zero_traffic = Condition::ZeroTraffic {
            window: thresholds.zero_traffic_window,
        };

        match kind {
            ConditionKind::LowSuccessRatio => low_ratio,
            ConditionKind::ZeroTraffic => zero_traffic,
            ConditionKind::Any => Condition::Any(vec![low_ratio, zero_traffic]),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Condition::LowSuccessRatio { .. } => "low_success_ratio",
            Condition::ZeroTraffic { .. } => "zero_traffic",
            Condition::Any(_) => "any",
        }
    }

    /// Longest window this condition reads.
    pub fn max_window(&self) -> Duration {
        match self {
            Condition::LowSuccessRatio { window, .. } | Condition::ZeroTraffic { window } => *window,
            Condition::Any(inner) => inner.iter().map(Condition::max_window).max().unwrap_or_default(),
        }
    }

    pub fn evaluate(&self, history: &SampleHistory) -> Verdict {
        match self {
            Condition::LowSuccessRatio { threshold_low, window } => {
                let rates = RateWindow::over(history, *window);
                if !rates.is_sufficient() {
                    return unmeasured(history, *window);
                }
                match rates.success_ratio() {
                    Ok(ratio) if ratio * 100.0 < *threshold_low => Verdict::Holds {
                        condition: self.name(),
                        value: ratio * 100.0,
                    },
                    Ok(_) => Verdict::Clear,
                    Err(e) => {
                        tracing::debug!(error = %e, "Ratio condition not evaluable");
                        Verdict::Clear
                    }
                }
            }
            Condition::ZeroTraffic { window } => {
                let rates = RateWindow::over(history, *window);
                if !rates.is_sufficient() {
                    return unmeasured(history, *window);
                }
                if rates.total_rate() == 0.0 {
                    Verdict::Holds {
                        condition: self.name(),
                        value: 0.0,
                    }
                } else {
                    Verdict::Clear
                }
            }
            Condition::Any(inner) => {
                let mut all_insufficient = !inner.is_empty();
                let mut gap = false;
                for condition in inner {
                    match condition.evaluate(history) {
                        held @ Verdict::Holds { .. } => return held,
                        Verdict::Clear => all_insufficient = false,
                        Verdict::DataGap => gap = true,
                        Verdict::InsufficientData => {}
                    }
                }
                if gap {
                    Verdict::DataGap
                } else if all_insufficient {
                    Verdict::InsufficientData
                } else {
                    Verdict::Clear
                }
            }
        }
    }
}

fn unmeasured(history: &SampleHistory, window: Duration) -> Verdict {
    if history.has_sample_before(window) {
        Verdict::DataGap
    } else {
        Verdict::InsufficientData
    }
}
