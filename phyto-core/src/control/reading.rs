//! Sensor snapshot

use crate::config::SensorLimits;
use crate::traits::{Quantity, SensorFault, SensorReader};

/// One reading of every sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// Temperature (°C)
    pub temperature: i32,
    /// Illuminance (lx)
    pub illuminance: i32,
    /// Water level (sensor units)
    pub water_level: i32,
}

/// A failed sensor read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorError {
    /// Quantity that failed
    pub quantity: Quantity,
    /// Reported fault
    pub fault: SensorFault,
}

impl Reading {
    /// Read all sensors
    ///
    /// Stops at the first failing sensor. Values outside the sensor limits
    /// are reported as [`SensorFault::OutOfRange`].
    pub fn acquire<S: SensorReader + ?Sized>(
        sensors: &mut S,
        limits: &SensorLimits,
    ) -> Result<Self, SensorError> {
        Ok(Self {
            temperature: read_checked(sensors, limits, Quantity::Temperature)?,
            illuminance: read_checked(sensors, limits, Quantity::Illuminance)?,
            water_level: read_checked(sensors, limits, Quantity::WaterLevel)?,
        })
    }
}

fn read_checked<S: SensorReader + ?Sized>(
    sensors: &mut S,
    limits: &SensorLimits,
    quantity: Quantity,
) -> Result<i32, SensorError> {
    let fail = |fault| SensorError { quantity, fault };
    let value = sensors.read(quantity).map_err(fail)?;
    if limits.span(quantity).contains(value) {
        Ok(value)
    } else {
        Err(fail(SensorFault::OutOfRange))
    }
}
