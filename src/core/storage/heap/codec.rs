//! Row codec: `Tuple` to stored bytes and back.
//!
//! Layout: u32 column count, null bitmap (one bit per column, LSB-first
//! within each byte), then one tag byte plus payload per present column.
//! The encoding is self-describing so that a forensic decode never has to
//! trust the catalog's idea of a row's shape.

use crate::core::common::traits::{DataDeserializer, DataSerializer};
use crate::core::common::types::{Tuple, Value};
use crate::core::common::OxiheapError;
use std::io::{Cursor, Read, Write};

const TAG_INTEGER: u8 = 1;
const TAG_FLOAT: u8 = 2;
const TAG_TEXT: u8 = 3;
const TAG_BOOLEAN: u8 = 4;
const TAG_BLOB: u8 = 5;

/// Upper bound on a decoded column count. A stored arity above this is
/// treated as corruption rather than an allocation request.
const MAX_DECODE_ARITY: usize = 1 << 16;

/// Encodes a tuple into its stored byte form.
///
/// # Errors
///
/// Returns `OxiheapError::Serialization` if a position is flagged valid but
/// holds `Value::Null`, or if the arity exceeds the u32 header.
pub fn encode(tuple: &Tuple) -> Result<Vec<u8>, OxiheapError> {
    let arity = u32::try_from(tuple.arity()).map_err(|_| {
        OxiheapError::Serialization("tuple arity exceeds encodable range".to_string())
    })?;

    let mut out = Vec::new();
    u32::serialize(&arity, &mut out)?;

    let mut bitmap = vec![0u8; tuple.arity().div_ceil(8)];
    for (i, valid) in tuple.validity().iter().enumerate() {
        if *valid {
            bitmap[i / 8] |= 1 << (i % 8);
        }
    }
    out.write_all(&bitmap)?;

    for (value, valid) in tuple.values().iter().zip(tuple.validity()) {
        if !*valid {
            continue;
        }
        match value {
            Value::Integer(v) => {
                out.push(TAG_INTEGER);
                i64::serialize(v, &mut out)?;
            }
            Value::Float(v) => {
                out.push(TAG_FLOAT);
                f64::serialize(v, &mut out)?;
            }
            Value::Text(v) => {
                out.push(TAG_TEXT);
                String::serialize(v, &mut out)?;
            }
            Value::Boolean(v) => {
                out.push(TAG_BOOLEAN);
                bool::serialize(v, &mut out)?;
            }
            Value::Blob(v) => {
                out.push(TAG_BLOB);
                <Vec<u8>>::serialize(v, &mut out)?;
            }
            Value::Null => {
                return Err(OxiheapError::Serialization(
                    "position flagged valid holds a null value".to_string(),
                ));
            }
        }
    }
    Ok(out)
}

/// Decodes a stored byte form back into a tuple.
///
/// # Errors
///
/// Returns `OxiheapError::Deserialization` (or `Io` for plain truncation)
/// when the bytes do not form a well-formed tuple.
pub fn decode(bytes: &[u8]) -> Result<Tuple, OxiheapError> {
    let mut cursor = Cursor::new(bytes);
    let arity = u32::deserialize(&mut cursor)? as usize;
    if arity > MAX_DECODE_ARITY {
        return Err(OxiheapError::Deserialization(format!(
            "stored column count {} is out of bounds",
            arity
        )));
    }

    let mut bitmap = vec![0u8; arity.div_ceil(8)];
    cursor
        .read_exact(&mut bitmap)
        .map_err(|e| OxiheapError::Deserialization(format!("null bitmap truncated: {}", e)))?;

    let mut values = Vec::with_capacity(arity);
    let mut validity = Vec::with_capacity(arity);
    for i in 0..arity {
        let valid = bitmap[i / 8] & (1 << (i % 8)) != 0;
        validity.push(valid);
        if !valid {
            values.push(Value::Null);
            continue;
        }
        let mut tag = [0u8; 1];
        cursor
            .read_exact(&mut tag)
            .map_err(|e| OxiheapError::Deserialization(format!("value tag truncated: {}", e)))?;
        let value = match tag[0] {
            TAG_INTEGER => Value::Integer(i64::deserialize(&mut cursor)?),
            TAG_FLOAT => Value::Float(f64::deserialize(&mut cursor)?),
            TAG_TEXT => Value::Text(String::deserialize(&mut cursor)?),
            TAG_BOOLEAN => Value::Boolean(bool::deserialize(&mut cursor)?),
            TAG_BLOB => Value::Blob(<Vec<u8>>::deserialize(&mut cursor)?),
            other => {
                return Err(OxiheapError::Deserialization(format!(
                    "unknown value tag: {}",
                    other
                )))
            }
        };
        values.push(value);
    }
    Tuple::new(values, validity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls_and_values_survive_encoding() {
        let tuple = Tuple::from_values(vec![
            Value::Integer(-5),
            Value::Null,
            Value::Text("recovered".to_string()),
            Value::Boolean(true),
            Value::Blob(vec![0xDE, 0xAD]),
            Value::Float(2.5),
        ]);
        let bytes = encode(&tuple).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, tuple);
        assert_eq!(decoded.is_null(1), Some(true));
    }

    #[test]
    fn empty_tuple_encodes() {
        let tuple = Tuple::from_values(vec![]);
        let decoded = decode(&encode(&tuple).unwrap()).unwrap();
        assert_eq!(decoded.arity(), 0);
    }

    #[test]
    fn valid_flag_over_null_value_is_rejected() {
        let tuple = Tuple::new(vec![Value::Null], vec![true]).unwrap();
        assert!(matches!(encode(&tuple), Err(OxiheapError::Serialization(_))));
    }

    #[test]
    fn unknown_tag_is_corruption() {
        let tuple = Tuple::from_values(vec![Value::Integer(1)]);
        let mut bytes = encode(&tuple).unwrap();
        // first tag byte sits right after the 4-byte arity and 1-byte bitmap
        bytes[5] = 0xEE;
        assert!(matches!(decode(&bytes), Err(OxiheapError::Deserialization(_))));
    }

    #[test]
    fn truncated_bitmap_is_corruption() {
        let tuple = Tuple::from_values(vec![Value::Integer(1), Value::Integer(2)]);
        let bytes = encode(&tuple).unwrap();
        assert!(matches!(decode(&bytes[..4]), Err(OxiheapError::Deserialization(_))));
    }

    #[test]
    fn absurd_arity_is_corruption_not_allocation() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF];
        match decode(&bytes) {
            Err(OxiheapError::Deserialization(msg)) => assert!(msg.contains("out of bounds")),
            other => panic!("expected Deserialization error, got {:?}", other),
        }
    }
}
