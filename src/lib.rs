//! Self-monitoring alerting pipeline for a model-serving endpoint.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod lifecycle;
pub mod notify;
pub mod observability;
pub mod resilience;
pub mod source;
pub mod status;

pub use config::schema::AlerterConfig;
pub use error::{Error, Result};
pub use evaluator::{EvaluationLoop, HealthEvaluator};
pub use lifecycle::Shutdown;
