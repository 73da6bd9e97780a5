//! Cadence scheduler
//!
//! Derives the measurement, communication and recording events from the
//! configured intervals.

pub mod periodic;
pub mod timer;

pub use periodic::{DueSet, Intervals, Scheduler};
pub use timer::{PeriodicTimer, TimerKind};
