//! Rate computation over a trailing window.
//!
//! Rates are per second. A window needs two samples spanning a positive
//! duration; anything less is `Insufficient` and every rate reads as zero.

use std::time::Duration;

use crate::error::Error;
use crate::evaluator::sample::SampleHistory;

/// Counter deltas over one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateWindow {
    Insufficient,
    Measured {
        successful_delta: u64,
        total_delta: u64,
        elapsed_secs: f64,
    },
}

impl RateWindow {
    /// Measure the window ending at the latest sample in `history`.
    pub fn over(history: &SampleHistory, window: Duration) -> Self {
        let mut samples = history.window(window);
        let Some(first) = samples.next() else {
            return RateWindow::Insufficient;
        };
        let Some(last) = samples.last() else {
            return RateWindow::Insufficient;
        };

        let elapsed_secs = (last.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0;
        if elapsed_secs <= 0.0 {
            return RateWindow::Insufficient;
        }

        RateWindow::Measured {
            // History counts are reset-adjusted and never decrease.
            successful_delta: last.successful_count.saturating_sub(first.successful_count),
            total_delta: last.total_count.saturating_sub(first.total_count),
            elapsed_secs,
        }
    }

    pub fn is_sufficient(&self) -> bool {
        matches!(self, RateWindow::Measured { .. })
    }

    /// Requests per second; `0` when the window is insufficient.
    pub fn total_rate(&self) -> f64 {
        match *self {
            RateWindow::Measured { total_delta, elapsed_secs, .. } => total_delta as f64 / elapsed_secs,
            RateWindow::Insufficient => 0.0,
        }
    }

    /// Successful requests per second; `0` when the window is insufficient.
    pub fn success_rate(&self) -> f64 {
        match *self {
            RateWindow::Measured { successful_delta, elapsed_secs, .. } => successful_delta as f64 / elapsed_secs,
            RateWindow::Insufficient => 0.0,
        }
    }

    /// `success_rate / total_rate`, defined only while there is traffic.
    pub fn success_ratio(&self) -> Result<f64, Error> {
        let total = self.total_rate();
        if total > 0.0 {
            Ok(self.success_rate() / total)
        } else {
            Err(Error::UndefinedMetric("success_ratio"))
        }
    }
}
