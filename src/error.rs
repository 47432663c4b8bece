//! Crate-level error taxonomy.

use thiserror::Error;

use crate::config::ConfigError;
use crate::notify::NotifyError;
use crate::source::SourceError;

/// Errors surfaced by the alerter.
///
/// `ConfigInvalid` is only produced at startup. `DataUnavailable` and
/// `Notification` are recovered inside the evaluation loop.
/// `UndefinedMetric` marks a derived value that does not exist for the
/// current window; it is never coerced into a comparison result.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(#[from] ConfigError),

    #[error("data unavailable: {0}")]
    DataUnavailable(#[from] SourceError),

    #[error("{0} is undefined for the current window")]
    UndefinedMetric(&'static str),

    #[error("notification failed: {0}")]
    Notification(#[from] NotifyError),

    #[error("startup failed: {0}")]
    Startup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
