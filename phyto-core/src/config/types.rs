//! Configuration type definitions
//!
//! [`RawConfig`] is the control block as a configuration source supplies
//! it: plain signed integers that may violate any invariant.
//! [`ControlConfig`] is the validated form the rest of the crate consumes.
//! The only way from one to the other is [`RawConfig::validate`].

use crate::scheduler::{Intervals, TimerKind};
use crate::traits::Quantity;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default length of the time-of-day domain (one unit per minute)
pub const DEFAULT_DAY_LENGTH: u32 = 1440;

/// Which temperature excursion drives aeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ThermalResponse {
    /// No actuator assigned; excursions are reported only
    #[default]
    Unassigned,
    /// Aerate while above the deviation band
    AerateWhenHigh,
    /// Aerate while below the deviation band
    AerateWhenLow,
    /// Aerate on an excursion in either direction
    AerateOnAnyExcursion,
}

/// What the recorder does with a record the sink could not take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SinkPolicy {
    /// Queue in a bounded backlog, dropping the oldest entry when full
    #[default]
    Buffer,
    /// Drop the record and report it
    Drop,
}

/// Inclusive value range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Span {
    pub min: i32,
    pub max: i32,
}

impl Span {
    /// Create a new inclusive range
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Check if a value lies in the range
    pub const fn contains(&self, value: i32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Representable range of each sensor
///
/// Used to validate thresholds on load and to reject readings outside
/// what the fitted sensors can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorLimits {
    /// Temperature range (°C)
    pub temperature: Span,
    /// Illuminance range (lx)
    pub illuminance: Span,
    /// Water level range (sensor units)
    pub water_level: Span,
}

impl SensorLimits {
    /// Range for a quantity
    pub const fn span(&self, quantity: Quantity) -> Span {
        match quantity {
            Quantity::Temperature => self.temperature,
            Quantity::Illuminance => self.illuminance,
            Quantity::WaterLevel => self.water_level,
        }
    }
}

impl Default for SensorLimits {
    fn default() -> Self {
        Self {
            temperature: Span::new(-40, 125),
            illuminance: Span::new(0, 65_535),
            water_level: Span::new(0, 1_023),
        }
    }
}

/// Reasons a configuration is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// An interval is zero or negative
    NonPositiveInterval(TimerKind),
    /// Temperature deviation outside 0..=100 percent
    DeviationOutOfRange,
    /// A threshold lies outside the sensor range
    ThresholdOutOfRange(Quantity),
    /// Time-of-day domain length is zero or negative
    InvalidDayLength,
    /// Lights-off window start/end or day offset outside the day
    ScheduleOutOfRange,
    /// Pump duration is negative
    NegativePumpTime,
    /// Pump rest period is negative
    NegativePumpRest,
}

/// Control configuration as supplied by a configuration source
///
/// Field names follow the stored control block layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawConfig {
    /// Allowed temperature deviation (± percent of `ces_thd`)
    pub ces_dev: i32,
    /// Temperature threshold (°C)
    pub ces_thd: i32,
    /// Illuminance threshold (lx)
    pub lux_thd: i32,
    /// Lights-off window start (time of day)
    pub led_stat: i32,
    /// Lights-off window end (time of day)
    pub lec_fins: i32,
    /// Pump pulse length on low water
    pub pumping_t: i32,
    /// Rest after a pulse before a still-low level re-arms the pump (0 = never)
    pub pump_rest: i32,
    /// Measurement interval
    pub measinterval: i32,
    /// Communication interval
    pub dictinterval: i32,
    /// Recording interval
    pub recdinterval: i32,
    /// Low-water threshold (pump trigger disabled when None)
    pub wlv_thd: Option<i32>,
    /// Time-of-day domain length
    pub day_length: i32,
    /// Time of day at system start
    pub day_offset: i32,
    /// Temperature excursion response
    pub thermal: ThermalResponse,
    /// Record handling when a sink is unavailable
    pub sink_policy: SinkPolicy,
}

impl Default for RawConfig {
    fn default() -> Self {
        ControlConfig::default().into()
    }
}

impl RawConfig {
    /// Validate against the sensor limits
    ///
    /// Checks are ordered so the first reported error is the most
    /// fundamental one (intervals before thresholds before schedule).
    pub fn validate(&self, limits: &SensorLimits) -> Result<ControlConfig, ConfigError> {
        let measinterval = positive(self.measinterval, TimerKind::Measurement)?;
        let dictinterval = positive(self.dictinterval, TimerKind::Communication)?;
        let recdinterval = positive(self.recdinterval, TimerKind::Recording)?;

        if !(0..=100).contains(&self.ces_dev) {
            return Err(ConfigError::DeviationOutOfRange);
        }
        if !limits.temperature.contains(self.ces_thd) {
            return Err(ConfigError::ThresholdOutOfRange(Quantity::Temperature));
        }
        if !limits.illuminance.contains(self.lux_thd) {
            return Err(ConfigError::ThresholdOutOfRange(Quantity::Illuminance));
        }
        if let Some(wlv_thd) = self.wlv_thd {
            if !limits.water_level.contains(wlv_thd) {
                return Err(ConfigError::ThresholdOutOfRange(Quantity::WaterLevel));
            }
        }

        if self.day_length <= 0 {
            return Err(ConfigError::InvalidDayLength);
        }
        let day_length = self.day_length as u32;
        let led_stat = time_of_day(self.led_stat, day_length)?;
        let lec_fins = time_of_day(self.lec_fins, day_length)?;
        let day_offset = time_of_day(self.day_offset, day_length)?;

        if self.pumping_t < 0 {
            return Err(ConfigError::NegativePumpTime);
        }
        if self.pump_rest < 0 {
            return Err(ConfigError::NegativePumpRest);
        }

        Ok(ControlConfig {
            ces_dev: self.ces_dev as u8,
            ces_thd: self.ces_thd,
            lux_thd: self.lux_thd,
            led_stat,
            lec_fins,
            pumping_t: self.pumping_t as u32,
            pump_rest: self.pump_rest as u32,
            measinterval,
            dictinterval,
            recdinterval,
            wlv_thd: self.wlv_thd,
            day_length,
            day_offset,
            thermal: self.thermal,
            sink_policy: self.sink_policy,
        })
    }
}

fn positive(value: i32, kind: TimerKind) -> Result<u32, ConfigError> {
    if value > 0 {
        Ok(value as u32)
    } else {
        Err(ConfigError::NonPositiveInterval(kind))
    }
}

fn time_of_day(value: i32, day_length: u32) -> Result<u32, ConfigError> {
    if value >= 0 && (value as u32) < day_length {
        Ok(value as u32)
    } else {
        Err(ConfigError::ScheduleOutOfRange)
    }
}

/// Validated control configuration
///
/// Intervals are strictly positive, schedule points lie inside the day
/// and thresholds lie inside the sensor limits the config was validated
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlConfig {
    /// Allowed temperature deviation (± percent of `ces_thd`)
    pub ces_dev: u8,
    /// Temperature threshold (°C)
    pub ces_thd: i32,
    /// Illuminance threshold (lx)
    pub lux_thd: i32,
    /// Lights-off window start (time of day)
    pub led_stat: u32,
    /// Lights-off window end (time of day)
    pub lec_fins: u32,
    /// Pump pulse length (0 disables pumping)
    pub pumping_t: u32,
    /// Rest after a pulse before a still-low level re-arms the pump
    ///
    /// A new pulse needs a level reading at or above `wlv_thd` since the
    /// last pulse, or, when non-zero, this long since the last pulse ended.
    pub pump_rest: u32,
    /// Measurement interval
    pub measinterval: u32,
    /// Communication interval
    pub dictinterval: u32,
    /// Recording interval
    pub recdinterval: u32,
    /// Low-water threshold
    pub wlv_thd: Option<i32>,
    /// Time-of-day domain length
    pub day_length: u32,
    /// Time of day at system start
    pub day_offset: u32,
    /// Temperature excursion response
    pub thermal: ThermalResponse,
    /// Record handling when a sink is unavailable
    pub sink_policy: SinkPolicy,
}

impl ControlConfig {
    /// Scheduler intervals
    pub const fn intervals(&self) -> Intervals {
        Intervals {
            measurement: self.measinterval,
            communication: self.dictinterval,
            recording: self.recdinterval,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            ces_dev: 5,
            ces_thd: 25,
            lux_thd: 300,
            led_stat: 1200,
            lec_fins: 600,
            pumping_t: 30,
            pump_rest: 0,
            measinterval: 10,
            dictinterval: 60,
            recdinterval: 20,
            wlv_thd: None,
            day_length: DEFAULT_DAY_LENGTH,
            day_offset: 0,
            thermal: ThermalResponse::Unassigned,
            sink_policy: SinkPolicy::Buffer,
        }
    }
}

impl From<ControlConfig> for RawConfig {
    fn from(config: ControlConfig) -> Self {
        Self {
            ces_dev: config.ces_dev as i32,
            ces_thd: config.ces_thd,
            lux_thd: config.lux_thd,
            led_stat: config.led_stat as i32,
            lec_fins: config.lec_fins as i32,
            pumping_t: config.pumping_t as i32,
            pump_rest: config.pump_rest as i32,
            measinterval: config.measinterval as i32,
            dictinterval: config.dictinterval as i32,
            recdinterval: config.recdinterval as i32,
            wlv_thd: config.wlv_thd,
            day_length: config.day_length as i32,
            day_offset: config.day_offset as i32,
            thermal: config.thermal,
            sink_policy: config.sink_policy,
        }
    }
}
