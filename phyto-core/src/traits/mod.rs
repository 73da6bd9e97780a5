//! Collaborator traits
//!
//! These traits define the interface between the control logic and the
//! surrounding firmware: hardware drivers, storage and transport.

pub mod actuator;
pub mod clock;
pub mod sensor;
pub mod sink;

pub use actuator::{Actuator, ActuatorFault, ActuatorSink};
pub use clock::Clock;
pub use sensor::{Quantity, SensorFault, SensorReader};
pub use sink::{RecordSink, SinkFault};
