//! Map surgery on dynamic CBOR values.
//!
//! Records are serialized as CBOR maps keyed by field name. Migrations use
//! these helpers to rename, insert or rewrite fields of payloads written by
//! an older schema.

use crate::error::{CodecError, CodecResult};
use ciborium::value::Value;

fn entries(value: &Value) -> CodecResult<&Vec<(Value, Value)>> {
    value
        .as_map()
        .ok_or_else(|| CodecError::invalid_structure("expected a map"))
}

fn entries_mut(value: &mut Value) -> CodecResult<&mut Vec<(Value, Value)>> {
    value
        .as_map_mut()
        .ok_or_else(|| CodecError::invalid_structure("expected a map"))
}

fn is_key(key: &Value, name: &str) -> bool {
    key.as_text() == Some(name)
}

/// Returns the value stored under the text key `name`.
pub fn field<'a>(value: &'a Value, name: &str) -> CodecResult<Option<&'a Value>> {
    Ok(entries(value)?
        .iter()
        .find(|(k, _)| is_key(k, name))
        .map(|(_, v)| v))
}

/// Returns a mutable reference to the value stored under `name`.
pub fn field_mut<'a>(value: &'a mut Value, name: &str) -> CodecResult<Option<&'a mut Value>> {
    Ok(entries_mut(value)?
        .iter_mut()
        .find(|(k, _)| is_key(k, name))
        .map(|(_, v)| v))
}

/// Inserts or replaces the field `name`, returning the previous value.
pub fn set_field(value: &mut Value, name: &str, new: Value) -> CodecResult<Option<Value>> {
    let map = entries_mut(value)?;
    if let Some((_, slot)) = map.iter_mut().find(|(k, _)| is_key(k, name)) {
        return Ok(Some(std::mem::replace(slot, new)));
    }
    map.push((Value::Text(name.to_string()), new));
    Ok(None)
}

/// Removes the field `name`, returning its value.
pub fn remove_field(value: &mut Value, name: &str) -> CodecResult<Option<Value>> {
    let map = entries_mut(value)?;
    let position = map.iter().position(|(k, _)| is_key(k, name));
    Ok(position.map(|i| map.remove(i).1))
}

/// Renames the field `from` to `to`. Returns false if `from` was absent.
pub fn rename_field(value: &mut Value, from: &str, to: &str) -> CodecResult<bool> {
    match remove_field(value, from)? {
        Some(v) => {
            set_field(value, to, v)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Value {
        Value::Map(vec![
            (Value::Text("gramps_id".into()), Value::Text("I0001".into())),
            (Value::Text("gender".into()), Value::Integer(1u8.into())),
        ])
    }

    #[test]
    fn read_field() {
        let p = person();
        assert_eq!(
            field(&p, "gramps_id").unwrap(),
            Some(&Value::Text("I0001".into()))
        );
        assert_eq!(field(&p, "missing").unwrap(), None);
    }

    #[test]
    fn replace_field_keeps_single_entry() {
        let mut p = person();
        let old = set_field(&mut p, "gender", Value::Text("Male".into())).unwrap();
        assert_eq!(old, Some(Value::Integer(1u8.into())));
        assert_eq!(p.as_map().unwrap().len(), 2);
    }

    #[test]
    fn rename() {
        let mut p = person();
        assert!(rename_field(&mut p, "gramps_id", "public_id").unwrap());
        assert!(field(&p, "gramps_id").unwrap().is_none());
        assert!(field(&p, "public_id").unwrap().is_some());
        assert!(!rename_field(&mut p, "gramps_id", "other").unwrap());
    }

    #[test]
    fn non_map_is_rejected() {
        let mut v = Value::Text("not a record".into());
        assert!(set_field(&mut v, "a", Value::Null).is_err());
        assert!(field(&v, "a").is_err());
    }
}
