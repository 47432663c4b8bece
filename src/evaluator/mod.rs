//! Health evaluation subsystem.
//!
//! # Data Flow
//! ```text
//! Counter source
//!     → sample.rs (validate, order, detect counter resets)
//!     → window.rs (rates over trailing windows)
//!     → condition.rs (LowSuccessRatio OR ZeroTraffic)
//!     → state.rs (OK → PENDING → FIRING → RESOLVED with hysteresis)
//!     → event.rs (one AlertEvent per transition)
//!
//! runner.rs drives the above once per tick and publishes
//! snapshot.rs for status readers.
//! ```
//!
//! # Design Decisions
//! - Undefined ratios are errors, never numbers
//! - Insufficient data evaluates as condition-false
//! - Only the loop mutates alert state; readers get copies

pub mod condition;
pub mod definition;
pub mod engine;
pub mod event;
pub mod runner;
pub mod sample;
pub mod snapshot;
pub mod state;
pub mod window;

pub use condition::{Condition, Verdict};
pub use definition::{definitions_from_config, AlertDefinition};
pub use engine::HealthEvaluator;
pub use event::AlertEvent;
pub use runner::{EvaluationLoop, TickOutcome};
pub use sample::Sample;
pub use snapshot::{AlertView, StatusHandle, StatusSnapshot};
pub use state::{AlertState, AlertStatus};
pub use window::RateWindow;
