//! Events reported by the control loop

use crate::control::TempStatus;
use crate::record::Channel;
use crate::safety::Health;
use crate::traits::{Actuator, ActuatorFault, Quantity, SensorFault, SinkFault};

/// Something that happened during one loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Configuration events
    /// A staged configuration became active
    ConfigApplied,

    // Control events
    /// Temperature moved into or out of the deviation band
    TemperatureChanged(TempStatus),
    /// An actuator accepted a new command
    ActuatorChanged(Actuator, bool),

    // Record events
    /// Records accepted by a sink (backlog included)
    RecordsSent(Channel, u16),
    /// The new record was queued for a later retry
    RecordBuffered(Channel),
    /// Records discarded
    RecordsDropped(Channel, u16),
    /// A tick was skipped because the last measurement failed
    RecordSkipped(Channel),

    // Fault events
    /// A sensor read failed; actuator commands are held
    SensorFault(Quantity, SensorFault),
    /// An actuator rejected a command; retried on the next evaluation
    ActuatorFault(Actuator, ActuatorFault),
    /// A sink rejected a record
    SinkFault(Channel, SinkFault),
    /// Overall health changed
    HealthChanged(Health),
}

impl Event {
    /// Check if this event reports a fault
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Event::SensorFault(..)
                | Event::ActuatorFault(..)
                | Event::SinkFault(..)
                | Event::RecordsDropped(..)
                | Event::HealthChanged(Health::Degraded(_))
        )
    }

    /// Check if this event concerns a record sink
    pub fn is_record_event(&self) -> bool {
        matches!(
            self,
            Event::RecordsSent(..)
                | Event::RecordBuffered(_)
                | Event::RecordsDropped(..)
                | Event::RecordSkipped(_)
                | Event::SinkFault(..)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::FaultKind;

    #[test]
    fn test_fault_events() {
        assert!(Event::SensorFault(Quantity::WaterLevel, SensorFault::Invalid).is_fault());
        assert!(Event::SinkFault(Channel::Uplink, SinkFault::Unavailable).is_fault());
        assert!(Event::HealthChanged(Health::Degraded(FaultKind::Storage)).is_fault());
        assert!(!Event::HealthChanged(Health::Ok).is_fault());
        assert!(!Event::ActuatorChanged(Actuator::Lighting, true).is_fault());
    }

    #[test]
    fn test_record_events() {
        assert!(Event::RecordSkipped(Channel::Storage).is_record_event());
        assert!(Event::RecordsSent(Channel::Uplink, 1).is_record_event());
        assert!(!Event::ConfigApplied.is_record_event());
    }
}
