//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Evaluation loop, dispatcher, status API produce:
//!     → logging.rs (structured log events, pretty or JSON)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout / log aggregation
//!     → Prometheus scrape of the metrics listener
//! ```
//!
//! # Design Decisions
//! - Metric updates are no-ops until a recorder is installed
//! - The metrics listener is off by default

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
