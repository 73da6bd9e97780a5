//! Actuator output trait

use crate::time::Ticks;

/// Actuated outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Actuator {
    /// Supplemental grow lighting
    Lighting,
    /// Water pump
    Pump,
    /// Aeration (air pump / fan)
    Aeration,
}

impl Actuator {
    /// All actuators
    pub const ALL: [Actuator; 3] = [Actuator::Lighting, Actuator::Pump, Actuator::Aeration];
}

/// Errors reported by an actuator output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorFault {
    /// Output pin or driver rejected the write
    Output,
    /// Output is not fitted on this board
    NotFitted,
}

/// Trait for actuator outputs
///
/// Every call is idempotent: issuing the same command twice has no
/// additional effect. Calls are fire-and-forget; the returned fault is
/// informational and the control loop retries on its next decision.
pub trait ActuatorSink {
    /// Switch supplemental lighting
    fn set_lighting(&mut self, on: bool) -> Result<(), ActuatorFault>;

    /// Switch the pump
    ///
    /// `duration` is the planned pulse length when switching on, for outputs
    /// that can time themselves. The control loop always issues the
    /// matching off command when the pulse ends.
    fn set_pump(&mut self, on: bool, duration: Ticks) -> Result<(), ActuatorFault>;

    /// Switch aeration
    fn set_aeration(&mut self, on: bool) -> Result<(), ActuatorFault>;
}
