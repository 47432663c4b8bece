//! Counter sources.
//!
//! # Data Flow
//! ```text
//! Evaluation loop tick
//!     → CounterSource::fetch (under the loop's deadline)
//!     → Sample { timestamp, successful_count, total_count }
//! ```
//!
//! # Design Decisions
//! - The evaluator depends only on this trait, never on a wire format
//! - scrape.rs reads the Prometheus text exposition format
//! - Sample timestamps are taken at fetch time

pub mod scrape;

use std::time::Duration;
use async_trait::async_trait;
use thiserror::Error;

use crate::evaluator::Sample;

pub use scrape::ScrapeSource;

/// Errors that can occur while fetching counters.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(u16),

    /// Fetch exceeded its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Response body is not valid exposition text.
    #[error("parse error: {0}")]
    Parse(String),

    /// No series matched a selector.
    #[error("no series matched {0}")]
    MetricMissing(String),
}

/// Pull-based provider of counter samples.
#[async_trait]
pub trait CounterSource: Send + Sync {
    /// Identifier for logging.
    fn name(&self) -> &str;

    /// Read the current counters.
    async fn fetch(&self) -> Result<Sample, SourceError>;
}
