//! Time representation
//!
//! The clock collaborator reports elapsed time as a 32-bit tick count that
//! wraps at `u32::MAX`. Everything that compares two readings goes through
//! wrapping subtraction so comparisons stay correct across the wrap.
//! [`Uptime`] widens the wrapping count into a 64-bit monotonic total for
//! values that must never go backwards (record timestamps, time of day).

/// Elapsed-time units as reported by the clock
pub type Ticks = u32;

/// Ticks elapsed from `earlier` to `now`, correct across one wrap
#[inline]
pub const fn elapsed(now: Ticks, earlier: Ticks) -> Ticks {
    now.wrapping_sub(earlier)
}

/// Monotonic 64-bit uptime accumulated from wrapping clock readings
///
/// Must be advanced at least once per wrap period of the 32-bit clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Uptime {
    /// Last raw clock reading
    last: Option<Ticks>,
    /// Accumulated ticks since system start
    total: u64,
}

impl Uptime {
    /// Create an uptime tracker that has not seen a clock reading yet
    pub const fn new() -> Self {
        Self {
            last: None,
            total: 0,
        }
    }

    /// Advance with a new clock reading and return the total uptime
    ///
    /// The first reading is taken as the elapsed time since start.
    pub fn advance(&mut self, now: Ticks) -> u64 {
        self.total = match self.last {
            None => now as u64,
            Some(last) => self.total + elapsed(now, last) as u64,
        };
        self.last = Some(now);
        self.total
    }

    /// Total uptime at the last reading
    pub const fn total(&self) -> u64 {
        self.total
    }
}

/// Position on the cyclic time-of-day domain
///
/// `offset` is the time of day at system start, `day_length` the length of
/// the domain. `day_length` must be non-zero.
pub fn time_of_day(uptime: u64, offset: u32, day_length: u32) -> u32 {
    let day = day_length.max(1) as u64;
    ((uptime + offset as u64) % day) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_across_wrap() {
        assert_eq!(elapsed(5, u32::MAX - 4), 10);
        assert_eq!(elapsed(100, 40), 60);
    }

    #[test]
    fn test_uptime_first_reading() {
        let mut uptime = Uptime::new();
        assert_eq!(uptime.advance(1_000), 1_000);
        assert_eq!(uptime.advance(1_500), 1_500);
    }

    #[test]
    fn test_uptime_keeps_growing_through_wrap() {
        let mut uptime = Uptime::new();
        uptime.advance(u32::MAX - 9);
        let total = uptime.advance(10);
        assert_eq!(total, u32::MAX as u64 + 11);
        assert_eq!(uptime.total(), total);
    }

    #[test]
    fn test_time_of_day_wraps_daily() {
        assert_eq!(time_of_day(0, 0, 1440), 0);
        assert_eq!(time_of_day(620, 0, 1440), 620);
        assert_eq!(time_of_day(1440 + 30, 0, 1440), 30);
        // Started at 23:00
        assert_eq!(time_of_day(90, 1380, 1440), 30);
    }
}
