//! Control configuration
//!
//! Configuration types, validation, the runtime store and the text and
//! binary forms a configuration source supplies.

#[cfg(feature = "serde")]
pub mod blob;
pub mod source;
pub mod store;
pub mod types;

#[cfg(feature = "serde")]
pub use blob::{decode_config, encode_config, BlobError, ConfigBlob};
pub use source::{parse_config, ParseError};
pub use store::ConfigStore;
pub use types::*;
