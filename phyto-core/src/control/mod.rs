//! Control decisions
//!
//! Pure decision logic between sensor readings and actuator commands.

pub mod engine;
pub mod pump;
pub mod reading;
pub mod window;

pub use engine::{
    aeration_wanted, lighting_wanted, temperature_status, water_low, ActuatorCommands,
    ControlEngine, Decision, TempStatus,
};
pub use pump::PumpPulse;
pub use reading::{Reading, SensorError};
pub use window::DarkWindow;
