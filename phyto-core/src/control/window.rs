//! Lights-off window on the cyclic time-of-day domain
//!
//! The window is closed, `[start, end]`: both bounds are lights-off times.
//! When `start > end` the window crosses the end of the day (e.g. 20:00 to
//! 06:00) and containment is the union of `[start, day)` and `[0, end]`.
//! `start == end` covers that single time of day.

/// Lights-off window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DarkWindow {
    /// Time of day the window opens
    pub start: u32,
    /// Time of day the window closes
    pub end: u32,
}

impl DarkWindow {
    /// Create a new window
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Check if the window wraps past the end of the day
    pub const fn wraps(&self) -> bool {
        self.start > self.end
    }

    /// Check if a time of day falls inside the window
    pub const fn contains(&self, time_of_day: u32) -> bool {
        if self.wraps() {
            time_of_day >= self.start || time_of_day <= self.end
        } else {
            time_of_day >= self.start && time_of_day <= self.end
        }
    }
}
