//! Board-agnostic core logic for the growth controller firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Collaborator traits (clock, sensors, actuators, record sinks)
//! - Control configuration, validation and configuration sources
//! - Periodic scheduler for the measurement, communication and recording cadences
//! - Control engine (temperature, lighting schedule, pump pulses)
//! - Record assembly with bounded buffering
//! - Fault monitoring
//! - The control loop tying it all together

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod control;
pub mod record;
pub mod runtime;
pub mod safety;
pub mod scheduler;
pub mod time;
pub mod traits;
