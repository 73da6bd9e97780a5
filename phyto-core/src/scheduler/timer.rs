//! Periodic timer
//!
//! A single wraparound-safe periodic timer. Due-ness is computed as
//! `now - last_fire >= interval` with wrapping subtraction, so the timer
//! keeps working when the clock wraps at `u32::MAX`.

use crate::time::{elapsed, Ticks};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Timer kinds, in firing priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TimerKind {
    /// Read sensors and run the control engine
    Measurement,
    /// Capture a record for persistence
    Recording,
    /// Send telemetry to the transport
    Communication,
}

impl TimerKind {
    /// All kinds in priority order
    pub const ALL: [TimerKind; 3] = [
        TimerKind::Measurement,
        TimerKind::Recording,
        TimerKind::Communication,
    ];

    /// Bit used in a due set
    pub(crate) const fn bit(self) -> u8 {
        match self {
            TimerKind::Measurement => 0b001,
            TimerKind::Recording => 0b010,
            TimerKind::Communication => 0b100,
        }
    }
}

/// Periodic timer with drift-free reset to the actual fire time
///
/// On firing, `last_fire` is set to the time the timer was serviced, not to
/// the theoretical due time. A late tick therefore delays the following
/// fire instead of producing a burst of catch-up fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeriodicTimer {
    /// Period between fires
    interval: Ticks,
    /// Time of the last fire (None = fire on the next tick)
    last_fire: Option<Ticks>,
}

impl PeriodicTimer {
    /// Create a timer that fires on its first tick
    pub const fn new(interval: Ticks) -> Self {
        Self {
            interval,
            last_fire: None,
        }
    }

    /// Get the interval
    pub const fn interval(&self) -> Ticks {
        self.interval
    }

    /// Get the time of the last fire
    pub const fn last_fire(&self) -> Option<Ticks> {
        self.last_fire
    }

    /// Change the interval, keeping the last fire time
    pub fn set_interval(&mut self, interval: Ticks) {
        self.interval = interval;
    }

    /// Check if the timer is due at `now`
    pub fn is_due(&self, now: Ticks) -> bool {
        match self.last_fire {
            None => true,
            Some(last) => elapsed(now, last) >= self.interval,
        }
    }

    /// Fire the timer if it is due
    ///
    /// Returns true if the timer fired.
    pub fn poll(&mut self, now: Ticks) -> bool {
        if self.is_due(now) {
            self.last_fire = Some(now);
            true
        } else {
            false
        }
    }

    /// Time until the timer is due (0 if due now)
    pub fn remaining(&self, now: Ticks) -> Ticks {
        match self.last_fire {
            None => 0,
            Some(last) => self.interval.saturating_sub(elapsed(now, last)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_immediately_then_periodically() {
        let mut timer = PeriodicTimer::new(10);
        assert!(timer.poll(3));
        assert!(!timer.poll(12));
        assert!(timer.poll(13));
        assert_eq!(timer.last_fire(), Some(13));
    }

    #[test]
    fn test_late_tick_resets_phase() {
        let mut timer = PeriodicTimer::new(10);
        timer.poll(0);

        // Serviced late at 25: one fire, next due at 35 (not 30)
        assert!(timer.poll(25));
        assert!(!timer.poll(30));
        assert!(timer.poll(35));
    }

    #[test]
    fn test_due_across_clock_wrap() {
        let mut timer = PeriodicTimer::new(10);
        timer.poll(u32::MAX - 3);

        assert!(!timer.poll(2)); // 6 elapsed
        assert_eq!(timer.remaining(2), 4);
        assert!(timer.poll(6)); // 10 elapsed
    }

    #[test]
    fn test_interval_change_keeps_phase() {
        let mut timer = PeriodicTimer::new(60);
        timer.poll(100);
        timer.set_interval(20);
        assert_eq!(timer.remaining(110), 10);
        assert!(timer.poll(120));
    }

    #[test]
    fn test_kind_priority_order() {
        assert!(TimerKind::Measurement < TimerKind::Recording);
        assert!(TimerKind::Recording < TimerKind::Communication);
    }
}
