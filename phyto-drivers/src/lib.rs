//! Hardware adapters
//!
//! This crate provides implementations of the collaborator traits defined
//! in phyto-core on top of generic hardware abstractions:
//!
//! - Relay outputs for lighting, pump and aeration (embedded-hal GPIO)
//! - Linearly scaled analog sensors with open/short detection
//! - Clock backed by embassy-time (feature `embassy`)

#![no_std]
#![deny(unsafe_code)]

pub mod analog;
#[cfg(feature = "embassy")]
pub mod clock;
pub mod relay;
