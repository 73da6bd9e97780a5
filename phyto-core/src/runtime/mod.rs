//! Control loop runtime
//!
//! Ties the scheduler, control engine, recorders and fault monitor to the
//! collaborators and runs them one iteration at a time.

pub mod control_loop;
pub mod events;

pub use control_loop::{ControlLoop, Iteration, MAX_EVENTS};
pub use events::Event;
