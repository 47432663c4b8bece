//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Notification delivery:
//!     → retries.rs (retry failed sends up to the attempt budget)
//!     → backoff.rs (exponential delay with jitter between attempts)
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline (fetch timeout, webhook timeout)
//! - Jittered backoff prevents synchronized retries
//! - Retries are bounded; leftovers are re-queued by the dispatcher

pub mod backoff;
pub mod retries;

pub use retries::{retry, RetryPolicy};
