use crate::core::common::OxiheapError;
use std::io::{Read, Write};

/// Trait for serializing data of type T into a byte stream.
pub trait DataSerializer<T> {
    fn serialize<W: Write>(value: &T, writer: &mut W) -> Result<(), OxiheapError>;
}

/// Trait for deserializing data of type T from a byte stream.
pub trait DataDeserializer<T> {
    fn deserialize<R: Read>(reader: &mut R) -> Result<T, OxiheapError>;
}
