//! Clock backed by embassy-time

use embassy_time::{Duration, Instant};
use phyto_core::time::Ticks;
use phyto_core::traits::Clock;

/// Clock counting in a fixed unit since boot
///
/// The count is truncated to 32 bits and wraps; the core handles the wrap.
#[derive(Debug, Clone, Copy)]
pub struct EmbassyClock {
    /// Length of one clock unit in embassy ticks
    unit_ticks: u64,
}

impl EmbassyClock {
    /// Create a clock with the given unit
    pub fn new(unit: Duration) -> Self {
        Self {
            unit_ticks: unit.as_ticks().max(1),
        }
    }

    /// One unit per second
    pub fn seconds() -> Self {
        Self::new(Duration::from_secs(1))
    }

    /// One unit per minute (matches the default 1440-unit day)
    pub fn minutes() -> Self {
        Self::new(Duration::from_secs(60))
    }

    /// Duration of `units` clock units, for sleeping until the next cadence
    pub fn duration(&self, units: Ticks) -> Duration {
        Duration::from_ticks(self.unit_ticks.saturating_mul(units as u64))
    }
}

impl Clock for EmbassyClock {
    fn now(&self) -> Ticks {
        (Instant::now().as_ticks() / self.unit_ticks) as Ticks
    }
}
