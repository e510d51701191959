//! Deserialization from CBOR bytes and dynamic values.

use crate::error::{CodecError, CodecResult};
use ciborium::value::Value;
use serde::de::DeserializeOwned;

/// Decodes CBOR bytes into any deserializable type.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    ciborium::de::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
}

/// Decodes CBOR bytes into a dynamic [`Value`].
pub fn value_from_cbor(bytes: &[u8]) -> CodecResult<Value> {
    from_cbor(bytes)
}

/// Converts a dynamic [`Value`] into a typed value.
pub fn from_value<T: DeserializeOwned>(value: Value) -> CodecResult<T> {
    value
        .deserialized()
        .map_err(|e| CodecError::decoding_failed(e.to_string()))
}
