//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML with ${VAR} placeholders)
//!     → template.rs (resolve placeholders against the environment)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AlerterConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; alert definitions never change at runtime
//! - All fields have defaults to allow minimal configs
//! - Any config error is fatal at startup, never at runtime

pub mod duration;
pub mod loader;
pub mod schema;
pub mod template;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::AlerterConfig;
pub use schema::AlertConfig;
pub use schema::ConditionKind;
pub use schema::EvaluatorConfig;
pub use schema::MetricSelector;
pub use schema::NotificationConfig;
pub use schema::ObservabilityConfig;
pub use schema::SourceConfig;
pub use schema::StatusConfig;
pub use schema::ThresholdConfig;
