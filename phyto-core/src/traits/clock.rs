//! Clock trait

use crate::time::Ticks;

/// Monotonic elapsed-time source
///
/// `now` counts time units since system start and wraps at `u32::MAX`.
/// The unit is whatever the configuration intervals are expressed in.
pub trait Clock {
    /// Current elapsed time
    fn now(&self) -> Ticks;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Ticks {
        (**self).now()
    }
}
