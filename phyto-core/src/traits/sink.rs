//! Record sink trait

use crate::record::Record;

/// Errors reported by a persistence or transport sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SinkFault {
    /// Sink is not reachable (storage not mounted, link down)
    Unavailable,
    /// Sink has no room for the record
    Full,
    /// Sink refused the record
    Rejected,
}

/// Trait for persistence and transport collaborators
///
/// The storage format or wire format is the sink's concern. On success the
/// sink owns the record.
pub trait RecordSink {
    /// Hand a record to the sink
    fn emit(&mut self, record: Record) -> Result<(), SinkFault>;
}
