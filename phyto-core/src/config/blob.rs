//! Binary configuration blob
//!
//! The control block as stored in non-volatile memory: a postcard-serialized
//! [`RawConfig`] wrapped with a magic number, a format version and a CRC-32
//! over the serialized configuration. Where the bytes live is up to the
//! storage collaborator.

use serde::{Deserialize, Serialize};

use super::types::RawConfig;

/// Magic number to identify a control block
pub const CONFIG_MAGIC: u32 = 0x5048_5943; // "PHYC"

/// Current blob format version
pub const CONFIG_VERSION: u8 = 1;

/// Upper bound on an encoded blob
pub const MAX_BLOB_SIZE: usize = 96;

/// Blob encoding/decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlobError {
    /// Output buffer too small
    BufferTooSmall,
    /// Bytes are not a valid postcard blob
    Deserialize,
    /// Magic number mismatch (empty or foreign data)
    BadMagic,
    /// Blob written by an incompatible firmware
    VersionMismatch,
    /// CRC mismatch
    Corrupted,
}

/// Stored control block with header and checksum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigBlob {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    /// Control block
    pub config: RawConfig,
    /// CRC-32 of the serialized control block
    pub crc: u32,
}

impl ConfigBlob {
    /// Wrap a configuration with a fresh header and checksum
    pub fn new(config: RawConfig) -> Result<Self, BlobError> {
        Ok(Self {
            magic: CONFIG_MAGIC,
            version: CONFIG_VERSION,
            config,
            crc: config_crc(&config)?,
        })
    }

    /// Serialize into `buffer`, returning the used prefix
    pub fn encode<'a>(&self, buffer: &'a mut [u8]) -> Result<&'a mut [u8], BlobError> {
        postcard::to_slice(self, buffer).map_err(|_| BlobError::BufferTooSmall)
    }

    /// Deserialize and verify a stored blob
    pub fn decode(bytes: &[u8]) -> Result<Self, BlobError> {
        let blob: ConfigBlob = postcard::from_bytes(bytes).map_err(|_| BlobError::Deserialize)?;

        if blob.magic != CONFIG_MAGIC {
            return Err(BlobError::BadMagic);
        }
        if blob.version != CONFIG_VERSION {
            warn!(
                "Config blob version mismatch: found {}, expected {}",
                blob.version, CONFIG_VERSION
            );
            return Err(BlobError::VersionMismatch);
        }
        if blob.crc != config_crc(&blob.config)? {
            return Err(BlobError::Corrupted);
        }

        Ok(blob)
    }
}

/// Encode a configuration as a stored blob
pub fn encode_config<'a>(config: &RawConfig, buffer: &'a mut [u8]) -> Result<&'a mut [u8], BlobError> {
    ConfigBlob::new(*config)?.encode(buffer)
}

/// Decode a stored blob into a configuration
pub fn decode_config(bytes: &[u8]) -> Result<RawConfig, BlobError> {
    ConfigBlob::decode(bytes).map(|blob| blob.config)
}

/// CRC-32 over the postcard serialization of a configuration
fn config_crc(config: &RawConfig) -> Result<u32, BlobError> {
    let mut scratch = [0u8; MAX_BLOB_SIZE];
    let bytes = postcard::to_slice(config, &mut scratch).map_err(|_| BlobError::BufferTooSmall)?;
    Ok(!crc32_update(0xFFFF_FFFF, bytes))
}

/// CRC-32 update (IEEE 802.3 polynomial, bitwise)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
