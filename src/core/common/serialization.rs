use crate::core::common::traits::{DataDeserializer, DataSerializer};
use crate::core::common::OxiheapError;
use std::io::{Read, Write};

// Fixed-width integers are big-endian on the wire; variable-length payloads
// carry a u64 length prefix.

impl DataSerializer<u32> for u32 {
    fn serialize<W: Write>(value: &u32, writer: &mut W) -> Result<(), OxiheapError> {
        writer.write_all(&value.to_be_bytes())?;
        Ok(())
    }
}

impl DataDeserializer<u32> for u32 {
    fn deserialize<R: Read>(reader: &mut R) -> Result<u32, OxiheapError> {
        let mut bytes = [0u8; 4];
        reader.read_exact(&mut bytes)?;
        Ok(u32::from_be_bytes(bytes))
    }
}

impl DataSerializer<u64> for u64 {
    fn serialize<W: Write>(value: &u64, writer: &mut W) -> Result<(), OxiheapError> {
        writer.write_all(&value.to_be_bytes())?;
        Ok(())
    }
}

impl DataDeserializer<u64> for u64 {
    fn deserialize<R: Read>(reader: &mut R) -> Result<u64, OxiheapError> {
        let mut bytes = [0u8; 8];
        reader.read_exact(&mut bytes)?;
        Ok(u64::from_be_bytes(bytes))
    }
}

impl DataSerializer<i64> for i64 {
    fn serialize<W: Write>(value: &i64, writer: &mut W) -> Result<(), OxiheapError> {
        writer.write_all(&value.to_be_bytes())?;
        Ok(())
    }
}

impl DataDeserializer<i64> for i64 {
    fn deserialize<R: Read>(reader: &mut R) -> Result<i64, OxiheapError> {
        let mut bytes = [0u8; 8];
        reader.read_exact(&mut bytes)?;
        Ok(i64::from_be_bytes(bytes))
    }
}

impl DataSerializer<f64> for f64 {
    fn serialize<W: Write>(value: &f64, writer: &mut W) -> Result<(), OxiheapError> {
        writer.write_all(&value.to_be_bytes())?;
        Ok(())
    }
}

impl DataDeserializer<f64> for f64 {
    fn deserialize<R: Read>(reader: &mut R) -> Result<f64, OxiheapError> {
        let mut bytes = [0u8; 8];
        reader.read_exact(&mut bytes)?;
        Ok(f64::from_be_bytes(bytes))
    }
}

impl DataSerializer<bool> for bool {
    fn serialize<W: Write>(value: &bool, writer: &mut W) -> Result<(), OxiheapError> {
        writer.write_all(&[u8::from(*value)])?;
        Ok(())
    }
}

impl DataDeserializer<bool> for bool {
    fn deserialize<R: Read>(reader: &mut R) -> Result<bool, OxiheapError> {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        match byte[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(OxiheapError::Deserialization(format!(
                "invalid boolean byte: {}",
                other
            ))),
        }
    }
}

impl DataSerializer<String> for String {
    fn serialize<W: Write>(value: &String, writer: &mut W) -> Result<(), OxiheapError> {
        let bytes = value.as_bytes();
        let len = bytes.len() as u64;
        u64::serialize(&len, writer)?;
        writer.write_all(bytes)?;
        Ok(())
    }
}

impl DataDeserializer<String> for String {
    fn deserialize<R: Read>(reader: &mut R) -> Result<String, OxiheapError> {
        let len = u64::deserialize(reader)? as usize;
        let mut buffer = vec![0u8; len];
        reader.read_exact(&mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| OxiheapError::Deserialization(format!("UTF-8 conversion error: {}", e)))
    }
}

impl DataSerializer<Vec<u8>> for Vec<u8> {
    fn serialize<W: Write>(value: &Vec<u8>, writer: &mut W) -> Result<(), OxiheapError> {
        let len = value.len() as u64;
        u64::serialize(&len, writer)?;
        writer.write_all(value)?;
        Ok(())
    }
}

impl DataDeserializer<Vec<u8>> for Vec<u8> {
    fn deserialize<R: Read>(reader: &mut R) -> Result<Vec<u8>, OxiheapError> {
        let len = u64::deserialize(reader)? as usize;
        let mut buffer = vec![0u8; len];
        reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }
}
