//! Sensor reader trait

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Measured quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Quantity {
    /// Temperature in whole degrees Celsius
    Temperature,
    /// Illuminance in lux
    Illuminance,
    /// Water level in sensor units
    WaterLevel,
}

/// Errors that can occur while reading a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorFault {
    /// Sensor did not respond
    Unavailable,
    /// Sensor responded with data that could not be decoded
    Invalid,
    /// Reading outside the representable range
    OutOfRange,
}

/// Trait for the sensor collaborator
///
/// Reads are bounded-time synchronous calls. Implementations report a
/// fault instead of returning a guessed value.
pub trait SensorReader {
    /// Read the current temperature in whole degrees Celsius
    fn read_temperature(&mut self) -> Result<i32, SensorFault>;

    /// Read the current illuminance in lux
    fn read_illuminance(&mut self) -> Result<i32, SensorFault>;

    /// Read the current water level
    fn read_water_level(&mut self) -> Result<i32, SensorFault>;

    /// Read a single quantity
    fn read(&mut self, quantity: Quantity) -> Result<i32, SensorFault> {
        match quantity {
            Quantity::Temperature => self.read_temperature(),
            Quantity::Illuminance => self.read_illuminance(),
            Quantity::WaterLevel => self.read_water_level(),
        }
    }
}
