//! Fault monitor implementation
//!
//! Tracks sensor, sink and actuator faults. Sensor and sink faults are
//! non-fatal: the loop keeps running, but three failures in a row mark the
//! affected subsystem as degraded until it succeeds again.

use crate::record::Channel;

/// Consecutive failures before a subsystem counts as degraded
pub const MAX_CONSECUTIVE_FAILURES: u8 = 3;

/// Degraded subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultKind {
    /// Measurements keep failing
    Sensor,
    /// Persistence sink keeps failing
    Storage,
    /// Transport sink keeps failing
    Uplink,
}

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Health {
    /// All subsystems working
    Ok,
    /// A subsystem is failing
    Degraded(FaultKind),
}

/// Running fault totals since start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultCounts {
    /// Failed measurements
    pub sensor: u32,
    /// Failed persistence hand-offs
    pub storage: u32,
    /// Failed transport hand-offs
    pub uplink: u32,
    /// Rejected actuator writes
    pub actuator: u32,
    /// Rejected configurations
    pub config: u32,
    /// Records discarded by a recorder
    pub dropped_records: u32,
}

/// Fault monitor
#[derive(Debug, Clone, Default)]
pub struct FaultMonitor {
    /// Failed measurements in a row
    sensor_streak: u8,
    /// Failed persistence hand-offs in a row
    storage_streak: u8,
    /// Failed transport hand-offs in a row
    uplink_streak: u8,
    /// Totals
    counts: FaultCounts,
}

impl FaultMonitor {
    /// Create a new fault monitor
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the outcome of a measurement
    pub fn measurement(&mut self, ok: bool) {
        if ok {
            self.sensor_streak = 0;
        } else {
            self.sensor_streak = self.sensor_streak.saturating_add(1);
            self.counts.sensor = self.counts.sensor.saturating_add(1);
        }
    }

    /// Report the outcome of a sink hand-off
    pub fn delivery(&mut self, channel: Channel, ok: bool) {
        let (streak, total) = match channel {
            Channel::Storage => (&mut self.storage_streak, &mut self.counts.storage),
            Channel::Uplink => (&mut self.uplink_streak, &mut self.counts.uplink),
        };
        if ok {
            *streak = 0;
        } else {
            *streak = streak.saturating_add(1);
            *total = total.saturating_add(1);
        }
    }

    /// Report a rejected actuator write
    pub fn actuator_fault(&mut self) {
        self.counts.actuator = self.counts.actuator.saturating_add(1);
    }

    /// Report a rejected configuration
    pub fn config_rejected(&mut self) {
        self.counts.config = self.counts.config.saturating_add(1);
    }

    /// Report discarded records
    pub fn records_dropped(&mut self, count: usize) {
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        self.counts.dropped_records = self.counts.dropped_records.saturating_add(count);
    }

    /// Check all subsystems
    ///
    /// Returns the first degraded subsystem, or Ok if all are working.
    pub fn check(&self) -> Health {
        if self.sensor_streak >= MAX_CONSECUTIVE_FAILURES {
            return Health::Degraded(FaultKind::Sensor);
        }
        if self.storage_streak >= MAX_CONSECUTIVE_FAILURES {
            return Health::Degraded(FaultKind::Storage);
        }
        if self.uplink_streak >= MAX_CONSECUTIVE_FAILURES {
            return Health::Degraded(FaultKind::Uplink);
        }
        Health::Ok
    }

    /// Get fault totals
    pub fn counts(&self) -> &FaultCounts {
        &self.counts
    }
}
