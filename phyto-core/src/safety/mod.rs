//! Fault monitoring
//!
//! Counts faults the control loop reports and decides when the controller
//! is degraded.

pub mod monitor;

pub use monitor::{FaultCounts, FaultKind, FaultMonitor, Health, MAX_CONSECUTIVE_FAILURES};
