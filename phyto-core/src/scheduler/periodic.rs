//! Cadence scheduler
//!
//! Tracks the three independent cadences of the controller (measurement,
//! recording, communication) and reports which are due on each tick.

use super::timer::{PeriodicTimer, TimerKind};
use crate::time::Ticks;

/// Intervals of the three cadences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Intervals {
    /// Measurement interval
    pub measurement: Ticks,
    /// Communication interval
    pub communication: Ticks,
    /// Recording interval
    pub recording: Ticks,
}

/// Set of timers that fired on one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DueSet(u8);

impl DueSet {
    /// Empty set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Add a timer kind
    pub fn insert(&mut self, kind: TimerKind) {
        self.0 |= kind.bit();
    }

    /// Check if a timer kind is in the set
    pub const fn contains(&self, kind: TimerKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Check if nothing fired
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of timers that fired
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate in priority order (measurement, recording, communication)
    pub fn iter(&self) -> impl Iterator<Item = TimerKind> + '_ {
        TimerKind::ALL.into_iter().filter(|k| self.contains(*k))
    }
}

/// Cadence scheduler
///
/// All timers are armed at construction, so the first tick fires every
/// cadence. After that each timer fires once its interval has elapsed
/// since it last fired.
#[derive(Debug, Clone)]
pub struct Scheduler {
    measurement: PeriodicTimer,
    recording: PeriodicTimer,
    communication: PeriodicTimer,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new(intervals: Intervals) -> Self {
        Self {
            measurement: PeriodicTimer::new(intervals.measurement),
            recording: PeriodicTimer::new(intervals.recording),
            communication: PeriodicTimer::new(intervals.communication),
        }
    }

    /// Get current intervals
    pub fn intervals(&self) -> Intervals {
        Intervals {
            measurement: self.measurement.interval(),
            communication: self.communication.interval(),
            recording: self.recording.interval(),
        }
    }

    /// Apply new intervals
    ///
    /// Each timer keeps its last fire time, so a shortened interval takes
    /// effect from the previous fire and a lengthened one postpones it.
    pub fn set_intervals(&mut self, intervals: Intervals) {
        self.measurement.set_interval(intervals.measurement);
        self.recording.set_interval(intervals.recording);
        self.communication.set_interval(intervals.communication);
    }

    /// Get a timer by kind
    pub fn timer(&self, kind: TimerKind) -> &PeriodicTimer {
        match kind {
            TimerKind::Measurement => &self.measurement,
            TimerKind::Recording => &self.recording,
            TimerKind::Communication => &self.communication,
        }
    }

    fn timer_mut(&mut self, kind: TimerKind) -> &mut PeriodicTimer {
        match kind {
            TimerKind::Measurement => &mut self.measurement,
            TimerKind::Recording => &mut self.recording,
            TimerKind::Communication => &mut self.communication,
        }
    }

    /// Update scheduler with the current time
    ///
    /// Call this once per loop iteration. Returns the timers that fired;
    /// each fired timer is reset to `now`.
    pub fn tick(&mut self, now: Ticks) -> DueSet {
        let mut due = DueSet::empty();
        for kind in TimerKind::ALL {
            if self.timer_mut(kind).poll(now) {
                due.insert(kind);
            }
        }
        due
    }

    /// Time until the earliest timer is due
    pub fn next_due_in(&self, now: Ticks) -> Ticks {
        TimerKind::ALL
            .into_iter()
            .map(|k| self.timer(k).remaining(now))
            .min()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intervals() -> Intervals {
        Intervals {
            measurement: 10,
            communication: 60,
            recording: 20,
        }
    }

    #[test]
    fn test_first_tick_fires_everything() {
        let mut sched = Scheduler::new(intervals());
        let due = sched.tick(0);
        assert_eq!(due.len(), 3);
        assert!(due.contains(TimerKind::Measurement));
        assert!(due.contains(TimerKind::Recording));
        assert!(due.contains(TimerKind::Communication));
    }

    #[test]
    fn test_independent_cadences() {
        let mut sched = Scheduler::new(intervals());
        sched.tick(0);

        assert!(sched.tick(5).is_empty());

        let due = sched.tick(10);
        assert!(due.contains(TimerKind::Measurement));
        assert_eq!(due.len(), 1);

        let due = sched.tick(20);
        assert!(due.contains(TimerKind::Measurement));
        assert!(due.contains(TimerKind::Recording));
        assert!(!due.contains(TimerKind::Communication));

        let due = sched.tick(60);
        assert_eq!(due.len(), 3);
    }

    #[test]
    fn test_due_set_priority_order() {
        let mut sched = Scheduler::new(intervals());
        let due = sched.tick(0);
        let mut order = due.iter();
        assert_eq!(order.next(), Some(TimerKind::Measurement));
        assert_eq!(order.next(), Some(TimerKind::Recording));
        assert_eq!(order.next(), Some(TimerKind::Communication));
        assert_eq!(order.next(), None);
    }

    #[test]
    fn test_next_due_in() {
        let mut sched = Scheduler::new(intervals());
        assert_eq!(sched.next_due_in(0), 0);
        sched.tick(0);
        assert_eq!(sched.next_due_in(4), 6);
    }

    #[test]
    fn test_set_intervals_keeps_last_fire() {
        let mut sched = Scheduler::new(intervals());
        sched.tick(0);
        sched.set_intervals(Intervals {
            measurement: 5,
            communication: 60,
            recording: 20,
        });
        assert_eq!(sched.intervals().measurement, 5);
        assert!(sched.tick(5).contains(TimerKind::Measurement));
        assert_eq!(sched.timer(TimerKind::Communication).last_fire(), Some(0));
    }
}
