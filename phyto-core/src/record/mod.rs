//! Measurement records
//!
//! A [`Record`] is an immutable snapshot of one measurement, stamped with
//! the uptime at which it was captured. Records go to two sinks: the
//! persistence sink on the recording cadence and the transport sink on the
//! communication cadence. Each sink has its own [`Recorder`].

mod recorder;

pub use recorder::{Delivery, Recorder, RECORD_BACKLOG};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Upper bound on a postcard-encoded record
pub const MAX_RECORD_SIZE: usize = 25;

/// Record destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Channel {
    /// Persistence sink (recording cadence)
    Storage,
    /// Transport sink (communication cadence)
    Uplink,
}

/// Measurement record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Record {
    /// Uptime at capture
    pub run_t: u64,
    /// Temperature (°C)
    pub ces: i32,
    /// Illuminance (lx)
    pub lux: i32,
    /// Water level (sensor units)
    pub wlv: i32,
}

#[cfg(feature = "serde")]
impl Record {
    /// Serialize with postcard into `buffer`, returning the used prefix
    pub fn encode<'a>(&self, buffer: &'a mut [u8]) -> Result<&'a mut [u8], postcard::Error> {
        postcard::to_slice(self, buffer)
    }

    /// Deserialize a postcard-encoded record
    pub fn decode(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn test_largest_record_fits() {
        let record = Record {
            run_t: u64::MAX,
            ces: i32::MIN,
            lux: i32::MIN,
            wlv: i32::MIN,
        };
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let used = record.encode(&mut buffer).unwrap().len();
        assert_eq!(used, MAX_RECORD_SIZE);
        assert_eq!(Record::decode(&buffer[..used]).unwrap(), record);
    }

    #[test]
    fn test_truncated_record_rejected() {
        let record = Record {
            run_t: 620,
            ces: 25,
            lux: 250,
            wlv: 80,
        };
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let used = record.encode(&mut buffer).unwrap().len();
        assert!(Record::decode(&buffer[..used - 1]).is_err());
    }
}
