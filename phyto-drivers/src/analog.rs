//! Analog sensors
//!
//! Temperature, illuminance and water level read through ADC channels and
//! converted to engineering units by a linear scale. Readings pinned at a
//! supply rail are reported as faults instead of being converted: near the
//! top rail the sensor is open (disconnected), near the bottom rail it is
//! shorted.

use phyto_core::traits::{SensorFault, SensorReader};

/// ADC channel abstraction
pub trait AnalogChannel {
    /// Read the raw conversion result
    #[allow(clippy::result_unit_err)]
    fn read_raw(&mut self) -> Result<u16, ()>;
}

/// Linear conversion from raw ADC counts
///
/// Maps `raw_min..=raw_max` onto `out_min..=out_max` with integer
/// arithmetic. Raw values outside the calibrated span are extrapolated;
/// range checking against the sensor limits happens in the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinearScale {
    /// Raw count at `out_min`
    pub raw_min: u16,
    /// Raw count at `out_max`
    pub raw_max: u16,
    /// Output at `raw_min`
    pub out_min: i32,
    /// Output at `raw_max`
    pub out_max: i32,
    /// Full-scale count of the ADC (4096 for 12-bit)
    pub full_scale: u16,
    /// Counts from either rail treated as open/short (None = no detection)
    pub rail_margin: Option<u16>,
}

impl LinearScale {
    /// Create a scale over a 12-bit ADC with rail detection
    pub const fn new(raw_min: u16, raw_max: u16, out_min: i32, out_max: i32) -> Self {
        Self {
            raw_min,
            raw_max,
            out_min,
            out_max,
            full_scale: 4096,
            rail_margin: Some(10),
        }
    }

    /// Pass raw counts through unchanged (no rail detection)
    pub const fn raw(full_scale: u16) -> Self {
        Self {
            raw_min: 0,
            raw_max: full_scale,
            out_min: 0,
            out_max: full_scale as i32,
            full_scale,
            rail_margin: None,
        }
    }

    /// Disable rail detection
    ///
    /// For sensors whose legitimate range reaches a rail, e.g. a level
    /// probe in an empty tank.
    pub const fn without_rail_detection(mut self) -> Self {
        self.rail_margin = None;
        self
    }

    /// Convert a raw count
    pub fn convert(&self, raw: u16) -> Result<i32, SensorFault> {
        if let Some(margin) = self.rail_margin {
            // Open circuit (pinned at the top rail)
            if raw >= self.full_scale.saturating_sub(margin) {
                return Err(SensorFault::Unavailable);
            }
            // Short circuit (pinned at the bottom rail)
            if raw < margin {
                return Err(SensorFault::Invalid);
            }
        }

        let raw_span = self.raw_max as i64 - self.raw_min as i64;
        if raw_span == 0 {
            return Err(SensorFault::Invalid);
        }
        let out_span = self.out_max as i64 - self.out_min as i64;
        let offset = raw as i64 - self.raw_min as i64;
        let value = self.out_min as i64 + out_span * offset / raw_span;

        i32::try_from(value).map_err(|_| SensorFault::OutOfRange)
    }
}

/// One ADC channel with its scale
pub struct AnalogSensor<CH> {
    channel: CH,
    scale: LinearScale,
}

impl<CH: AnalogChannel> AnalogSensor<CH> {
    /// Create a new analog sensor
    pub fn new(channel: CH, scale: LinearScale) -> Self {
        Self { channel, scale }
    }

    /// Get the scale
    pub fn scale(&self) -> &LinearScale {
        &self.scale
    }

    /// Read and convert
    pub fn read(&mut self) -> Result<i32, SensorFault> {
        let raw = self
            .channel
            .read_raw()
            .map_err(|_| SensorFault::Unavailable)?;
        self.scale.convert(raw)
    }
}

/// Analog sensor set
pub struct AnalogSensors<T, L, W> {
    temperature: AnalogSensor<T>,
    illuminance: AnalogSensor<L>,
    water_level: AnalogSensor<W>,
}

impl<T: AnalogChannel, L: AnalogChannel, W: AnalogChannel> AnalogSensors<T, L, W> {
    /// Create a new sensor set
    pub fn new(
        temperature: AnalogSensor<T>,
        illuminance: AnalogSensor<L>,
        water_level: AnalogSensor<W>,
    ) -> Self {
        Self {
            temperature,
            illuminance,
            water_level,
        }
    }
}

impl<T: AnalogChannel, L: AnalogChannel, W: AnalogChannel> SensorReader
    for AnalogSensors<T, L, W>
{
    fn read_temperature(&mut self) -> Result<i32, SensorFault> {
        self.temperature.read()
    }

    fn read_illuminance(&mut self) -> Result<i32, SensorFault> {
        self.illuminance.read()
    }

    fn read_water_level(&mut self) -> Result<i32, SensorFault> {
        self.water_level.read()
    }
}
