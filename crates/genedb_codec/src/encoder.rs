//! Serialization into CBOR bytes and dynamic values.

use crate::error::{CodecError, CodecResult};
use ciborium::value::Value;
use serde::Serialize;

/// Encodes any serializable value to CBOR bytes.
pub fn to_cbor<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buf)
}

/// Converts any serializable value into a dynamic CBOR [`Value`].
pub fn to_value<T: Serialize>(value: &T) -> CodecResult<Value> {
    Value::serialized(value).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Encodes a dynamic [`Value`] to CBOR bytes.
pub fn value_to_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    to_cbor(value)
}
