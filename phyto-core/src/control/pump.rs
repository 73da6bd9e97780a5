//! Fixed-duration pump pulse
//!
//! The pump runs for exactly the configured duration once triggered and
//! then stops, whatever the water level reads in the meantime. This bounds
//! the worst-case run time when the level sensor is stuck or faulty.
//!
//! A finished pulse leaves the pump disarmed. It is armed again once the
//! level reads at or above the threshold, or once a configured rest period
//! has passed since the pulse ended. A level stuck below the threshold
//! therefore yields at most one pulse per rest period.

use crate::time::{elapsed, Ticks};

/// Pump pulse state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PumpPulse {
    /// Start time and length of the running pulse
    running: Option<(Ticks, Ticks)>,
    /// A new pulse may start
    armed: bool,
    /// End of the last pulse
    last_end: Option<Ticks>,
}

impl Default for PumpPulse {
    fn default() -> Self {
        Self::new()
    }
}

impl PumpPulse {
    /// Create an idle, armed pulse
    pub const fn new() -> Self {
        Self {
            running: None,
            armed: true,
            last_end: None,
        }
    }

    /// Check if the pump is running
    pub const fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Check if a new pulse may start
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Time left in the running pulse
    pub fn remaining(&self, now: Ticks) -> Option<Ticks> {
        self.running
            .map(|(start, duration)| duration.saturating_sub(elapsed(now, start)))
    }

    /// Start a pulse
    ///
    /// Returns true if a new pulse started. A running pulse is neither
    /// restarted nor extended, a zero duration never starts, and a
    /// disarmed pump waits for [`rearm`](Self::rearm).
    pub fn trigger(&mut self, now: Ticks, duration: Ticks) -> bool {
        if !self.armed || self.running.is_some() || duration == 0 {
            return false;
        }
        self.running = Some((now, duration));
        self.armed = false;
        true
    }

    /// End the pulse if its duration has elapsed
    ///
    /// Returns true if the pulse ended on this call.
    pub fn expire(&mut self, now: Ticks) -> bool {
        match self.running {
            Some((start, duration)) if elapsed(now, start) >= duration => {
                self.running = None;
                self.last_end = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Allow the next low-level reading to start a pulse
    ///
    /// Has no effect while a pulse is running.
    pub fn rearm(&mut self) {
        if self.running.is_none() {
            self.armed = true;
        }
    }

    /// Re-arm once `rest` has passed since the last pulse ended
    ///
    /// A zero rest never re-arms.
    pub fn rearm_after_rest(&mut self, now: Ticks, rest: Ticks) {
        if rest == 0 || self.running.is_some() {
            return;
        }
        if let Some(end) = self.last_end {
            if elapsed(now, end) >= rest {
                self.armed = true;
            }
        }
    }
}
