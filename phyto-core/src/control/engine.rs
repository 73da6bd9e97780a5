//! Control engine
//!
//! Turns a sensor reading, the active configuration and the time into
//! actuator commands:
//!
//! - temperature: excursion outside `ces_thd ± ces_dev%` drives aeration
//!   according to the configured [`ThermalResponse`]
//! - illuminance: lighting on below `lux_thd`, except inside the
//!   lights-off window
//! - water level: low water starts a fixed-length pump pulse
//!
//! The engine never talks to hardware. It keeps the last commands so a
//! failed measurement can hold them unchanged.

use super::pump::PumpPulse;
use super::reading::Reading;
use super::window::DarkWindow;
use crate::config::{ControlConfig, ThermalResponse};
use crate::time::Ticks;
use crate::traits::Actuator;

/// Desired state of every actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorCommands {
    /// Supplemental lighting
    pub lighting: bool,
    /// Water pump
    pub pump: bool,
    /// Aeration
    pub aeration: bool,
}

impl ActuatorCommands {
    /// Everything off
    pub const OFF: Self = Self {
        lighting: false,
        pump: false,
        aeration: false,
    };

    /// Get the command for one actuator
    pub const fn get(&self, actuator: Actuator) -> bool {
        match actuator {
            Actuator::Lighting => self.lighting,
            Actuator::Pump => self.pump,
            Actuator::Aeration => self.aeration,
        }
    }

    /// Set the command for one actuator
    pub fn set(&mut self, actuator: Actuator, on: bool) {
        match actuator {
            Actuator::Lighting => self.lighting = on,
            Actuator::Pump => self.pump = on,
            Actuator::Aeration => self.aeration = on,
        }
    }

    /// Actuators whose command differs from `previous`
    pub fn changes<'a>(&'a self, previous: &'a Self) -> impl Iterator<Item = Actuator> + 'a {
        Actuator::ALL
            .into_iter()
            .filter(move |a| self.get(*a) != previous.get(*a))
    }
}

/// Temperature relative to the deviation band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TempStatus {
    /// Within `ces_thd ± ces_dev%`
    #[default]
    Nominal,
    /// Above the band
    High,
    /// Below the band
    Low,
}

impl TempStatus {
    /// Check if the temperature is outside the band
    pub const fn is_excursion(&self) -> bool {
        !matches!(self, TempStatus::Nominal)
    }
}

/// Classify a temperature against the deviation band
///
/// Excursion when `|t - ces_thd| * 100 > |ces_thd| * ces_dev`, evaluated in
/// 64-bit integers so no reading can overflow it.
pub fn temperature_status(temperature: i32, config: &ControlConfig) -> TempStatus {
    let deviation = (temperature as i64 - config.ces_thd as i64).abs() * 100;
    let allowed = (config.ces_thd as i64).abs() * config.ces_dev as i64;

    if deviation <= allowed {
        TempStatus::Nominal
    } else if temperature > config.ces_thd {
        TempStatus::High
    } else {
        TempStatus::Low
    }
}

/// Aeration wanted for a temperature status
pub const fn aeration_wanted(status: TempStatus, response: ThermalResponse) -> bool {
    match response {
        ThermalResponse::Unassigned => false,
        ThermalResponse::AerateWhenHigh => matches!(status, TempStatus::High),
        ThermalResponse::AerateWhenLow => matches!(status, TempStatus::Low),
        ThermalResponse::AerateOnAnyExcursion => status.is_excursion(),
    }
}

/// Lighting wanted for an illuminance at a time of day
pub fn lighting_wanted(illuminance: i32, time_of_day: u32, config: &ControlConfig) -> bool {
    let dark = DarkWindow::new(config.led_stat, config.lec_fins);
    illuminance < config.lux_thd && !dark.contains(time_of_day)
}

/// Check if the water level is below the low-water threshold
pub fn water_low(water_level: i32, config: &ControlConfig) -> bool {
    config.wlv_thd.is_some_and(|threshold| water_level < threshold)
}

/// Result of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Decision {
    /// Commands after the evaluation
    pub commands: ActuatorCommands,
    /// Temperature classification
    pub temperature: TempStatus,
    /// A new pump pulse started
    pub pump_started: bool,
}

/// Control engine
#[derive(Debug, Clone, Default)]
pub struct ControlEngine {
    commands: ActuatorCommands,
    pump: PumpPulse,
    temperature: TempStatus,
}

impl ControlEngine {
    /// Create a new engine with everything off
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current commands
    pub fn commands(&self) -> ActuatorCommands {
        self.commands
    }

    /// Get the pump pulse state
    pub fn pump(&self) -> &PumpPulse {
        &self.pump
    }

    /// Get the last temperature classification
    pub fn temperature(&self) -> TempStatus {
        self.temperature
    }

    /// Evaluate a successful reading
    ///
    /// Evaluating the same inputs twice yields the same commands.
    pub fn evaluate(
        &mut self,
        reading: &Reading,
        config: &ControlConfig,
        now: Ticks,
        time_of_day: u32,
    ) -> Decision {
        let temperature = temperature_status(reading.temperature, config);
        if temperature != self.temperature {
            debug!("Temperature {:?} at {}", temperature, reading.temperature);
        }
        self.temperature = temperature;

        self.commands.aeration = aeration_wanted(temperature, config.thermal);
        self.commands.lighting = lighting_wanted(reading.illuminance, time_of_day, config);

        let low = water_low(reading.water_level, config);
        if low {
            self.pump.rearm_after_rest(now, config.pump_rest);
        } else {
            self.pump.rearm();
        }
        let pump_started = low && self.pump.trigger(now, config.pumping_t);
        if pump_started {
            info!("Pump pulse: {} units", config.pumping_t);
        }
        self.commands.pump = self.pump.is_running();

        Decision {
            commands: self.commands,
            temperature,
            pump_started,
        }
    }

    /// Keep the previous commands after a failed reading
    pub fn hold(&self) -> ActuatorCommands {
        self.commands
    }

    /// End the pump pulse when its time is up
    ///
    /// Runs every loop iteration, whether or not a measurement happens.
    /// Returns true if the pulse ended.
    pub fn service(&mut self, now: Ticks) -> bool {
        let stopped = self.pump.expire(now);
        if stopped {
            self.commands.pump = false;
        }
        stopped
    }
}
