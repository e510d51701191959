//! # GeneDB Codec
//!
//! CBOR encoding for GeneDB records.
//!
//! Records are serialized with `serde` into CBOR (via `ciborium`). The same
//! bytes are used for the undo log ("prior"/"new" values of a transaction)
//! and for the on-disk tables, so an undo replays exactly what was stored.
//!
//! Schema migrations work one level lower, on the dynamic [`Value`] tree,
//! because an old payload no longer matches the current record types. The
//! helpers in [`value`] cover the map surgery migrations need.
//!
//! ## Usage
//!
//! ```
//! use genedb_codec::{from_cbor, to_cbor};
//!
//! let bytes = to_cbor(&("I0001", 1887)).unwrap();
//! let decoded: (String, i32) = from_cbor(&bytes).unwrap();
//! assert_eq!(decoded, ("I0001".to_string(), 1887));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
pub mod value;

pub use ciborium::value::Value;
pub use decoder::{from_cbor, from_value, value_from_cbor};
pub use encoder::{to_cbor, to_value, value_to_cbor};
pub use error::{CodecError, CodecResult};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Trait for types that can be encoded to CBOR.
pub trait Encode {
    /// Encode this value to CBOR bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from CBOR.
pub trait Decode: Sized {
    /// Decode this value from CBOR bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

impl<T: Serialize> Encode for T {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_cbor(self)
    }
}

impl<T: DeserializeOwned> Decode for T {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        from_cbor(bytes)
    }
}
