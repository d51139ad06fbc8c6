//! hp-core: stable foundation for hydroplan.
//!
//! Contains:
//! - ids (stable compact IDs for network objects)
//! - numeric (Real + tolerances + float helpers)
//! - schedule (time-stepping horizon shared by solver and reports)
//! - error (shared error types)
//! - timing (stage timers for the run pipeline)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod schedule;
pub mod timing;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use schedule::{Schedule, StepKind, MAX_HORIZON_MONTHS};
