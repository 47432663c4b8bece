//! Counter samples and the bounded history they are kept in.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One reading of the request-outcome counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub successful_count: u64,
    pub total_count: u64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, successful_count: u64, total_count: u64) -> Self {
        Self {
            timestamp,
            successful_count,
            total_count,
        }
    }
}

/// Why a sample was not accepted into the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Successful count larger than total count.
    SuccessExceedsTotal,
    /// Timestamp equal to the latest accepted sample.
    Duplicate,
    /// Timestamp older than the latest accepted sample.
    OutOfOrder,
    /// More successes than requests since the previous sample.
    SuccessDeltaExceedsTotal,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rejection::SuccessExceedsTotal => "successful count exceeds total count",
            Rejection::Duplicate => "duplicate timestamp",
            Rejection::OutOfOrder => "timestamp older than latest sample",
            Rejection::SuccessDeltaExceedsTotal => "successful delta exceeds total delta",
        };
        f.write_str(s)
    }
}

/// Result of a successful push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    /// Appended to the existing history.
    Appended,
    /// A counter went backwards. Growth is counted from zero again and
    /// added on top of the values seen before the reset.
    Reset,
}

/// Time-ordered samples covering at least `retention`.
///
/// Stored counts are reset-adjusted: they keep increasing across a restart of
/// the monitored process, so a window spanning the restart still measures
/// the requests served on both sides of it.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    retention: chrono::Duration,
    samples: VecDeque<Sample>,
    /// Last accepted sample as reported by the source.
    last_raw: Option<Sample>,
    successful_offset: u64,
    total_offset: u64,
}

impl SampleHistory {
    pub fn new(retention: Duration) -> Self {
        Self {
            retention: to_chrono(retention),
            samples: VecDeque::new(),
            last_raw: None,
            successful_offset: 0,
            total_offset: 0,
        }
    }

    /// Validate and append a sample, evicting anything older than the retention.
    pub fn push(&mut self, sample: Sample) -> Result<Accepted, Rejection> {
        if sample.successful_count > sample.total_count {
            return Err(Rejection::SuccessExceedsTotal);
        }

        let mut outcome = Accepted::Appended;
        if let Some(last) = self.last_raw {
            if sample.timestamp == last.timestamp {
                return Err(Rejection::Duplicate);
            }
            if sample.timestamp < last.timestamp {
                return Err(Rejection::OutOfOrder);
            }

            if sample.total_count < last.total_count || sample.successful_count < last.successful_count {
                // Both counters restart together with the process.
                self.successful_offset = self.successful_offset.saturating_add(last.successful_count);
                self.total_offset = self.total_offset.saturating_add(last.total_count);
                outcome = Accepted::Reset;
            } else if sample.successful_count - last.successful_count > sample.total_count - last.total_count {
                return Err(Rejection::SuccessDeltaExceedsTotal);
            }
        }

        self.last_raw = Some(sample);
        self.samples.push_back(Sample::new(
            sample.timestamp,
            sample.successful_count.saturating_add(self.successful_offset),
            sample.total_count.saturating_add(self.total_offset),
        ));
        self.evict(sample.timestamp);
        Ok(outcome)
    }

    /// Drop samples older than the retention, keeping the newest of them so
    /// a gap in the data stays visible.
    fn evict(&mut self, now: DateTime<Utc>) {
        let Some(cutoff) = now.checked_sub_signed(self.retention) else {
            return;
        };
        while self.samples.get(1).is_some_and(|next| next.timestamp < cutoff) {
            self.samples.pop_front();
        }
    }

    /// True when some sample precedes `[latest - window, latest]`.
    ///
    /// With fewer than two samples inside the window this means the source
    /// went quiet for longer than the window, not that data is still warming up.
    pub fn has_sample_before(&self, window: Duration) -> bool {
        let Some(cutoff) = self
            .latest()
            .and_then(|s| s.timestamp.checked_sub_signed(to_chrono(window)))
        else {
            return false;
        };
        self.samples.front().is_some_and(|s| s.timestamp < cutoff)
    }

    /// Most recent accepted sample, reset-adjusted.
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Samples inside `[latest - window, latest]`, oldest first.
    pub fn window(&self, window: Duration) -> impl Iterator<Item = &Sample> {
        let cutoff = self
            .latest()
            .and_then(|s| s.timestamp.checked_sub_signed(to_chrono(window)));
        self.samples
            .iter()
            .filter(move |s| cutoff.map_or(true, |c| s.timestamp >= c))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Convert a configuration duration into a chrono duration, saturating.
pub(crate) fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}
