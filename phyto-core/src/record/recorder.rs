//! Recorder with bounded backlog
//!
//! Builds records from the latest measurement and hands them to a sink.
//! When the sink fails, [`SinkPolicy::Buffer`] keeps the record in a
//! fixed-capacity backlog (oldest evicted first when full) and
//! [`SinkPolicy::Drop`] discards it. The backlog is always retried, in
//! order, before a new record is emitted.

use heapless::Deque;

use super::Record;
use crate::config::SinkPolicy;
use crate::control::Reading;
use crate::traits::{RecordSink, SinkFault};

/// Default backlog capacity per sink
pub const RECORD_BACKLOG: usize = 16;

/// Outcome of one hand-off to a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Delivery {
    /// Records the sink accepted, backlog included
    pub sent: usize,
    /// The new record went into the backlog
    pub buffered: bool,
    /// Records discarded (new record under `Drop`, evicted under `Buffer`)
    pub dropped: usize,
    /// Fault that stopped delivery
    pub fault: Option<SinkFault>,
}

/// Record builder and sink feeder for one destination
#[derive(Debug, Clone)]
pub struct Recorder<const N: usize = RECORD_BACKLOG> {
    policy: SinkPolicy,
    backlog: Deque<Record, N>,
    last_run_t: Option<u64>,
}

impl<const N: usize> Recorder<N> {
    /// Create a new recorder
    pub const fn new(policy: SinkPolicy) -> Self {
        Self {
            policy,
            backlog: Deque::new(),
            last_run_t: None,
        }
    }

    /// Get the sink policy
    pub fn policy(&self) -> SinkPolicy {
        self.policy
    }

    /// Change the sink policy
    ///
    /// Records already in the backlog stay there and are still retried.
    pub fn set_policy(&mut self, policy: SinkPolicy) {
        self.policy = policy;
    }

    /// Number of records waiting for the sink
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Timestamp of the last captured record
    pub fn last_run_t(&self) -> Option<u64> {
        self.last_run_t
    }

    /// Build a record from a reading
    ///
    /// `run_t` never goes backwards: an uptime older than the previous
    /// record is clamped to it.
    pub fn capture(&mut self, uptime: u64, reading: &Reading) -> Record {
        let run_t = self.last_run_t.map_or(uptime, |last| uptime.max(last));
        self.last_run_t = Some(run_t);
        Record {
            run_t,
            ces: reading.temperature,
            lux: reading.illuminance,
            wlv: reading.water_level,
        }
    }

    /// Retry the backlog, oldest first
    ///
    /// Stops at the first failure; the failed record stays at the front.
    pub fn flush<K: RecordSink + ?Sized>(&mut self, sink: &mut K) -> Delivery {
        let mut delivery = Delivery::default();
        while let Some(record) = self.backlog.front().copied() {
            match sink.emit(record) {
                Ok(()) => {
                    self.backlog.pop_front();
                    delivery.sent += 1;
                }
                Err(fault) => {
                    delivery.fault = Some(fault);
                    break;
                }
            }
        }
        delivery
    }

    /// Hand a new record to the sink
    ///
    /// The backlog goes first. If it cannot be cleared, the new record is
    /// not attempted and is handled by the policy straight away.
    pub fn record<K: RecordSink + ?Sized>(&mut self, record: Record, sink: &mut K) -> Delivery {
        let mut delivery = self.flush(sink);

        if delivery.fault.is_none() {
            match sink.emit(record) {
                Ok(()) => {
                    delivery.sent += 1;
                    return delivery;
                }
                Err(fault) => delivery.fault = Some(fault),
            }
        }

        match self.policy {
            SinkPolicy::Buffer => {
                if self.backlog.is_full() {
                    self.backlog.pop_front();
                    delivery.dropped += 1;
                }
                let _ = self.backlog.push_back(record);
                delivery.buffered = true;
            }
            SinkPolicy::Drop => delivery.dropped += 1,
        }

        delivery
    }
}

impl<const N: usize> Default for Recorder<N> {
    fn default() -> Self {
        Self::new(SinkPolicy::default())
    }
}
