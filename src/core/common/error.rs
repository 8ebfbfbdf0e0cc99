use crate::core::common::types::ids::TableId;
use std::fmt;

#[derive(Debug)]
pub enum OxiheapError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Serialization(String),
    Deserialization(String),
    Storage(String),
    RelationNotFound(String),
    AlreadyExists { name: String },
    SchemaMismatch { declared: usize, base: usize },
    LockUnavailable { table: TableId, holder: u64 },
    InvalidInput { message: String },
    Configuration(String),
    Internal(String),
}

impl fmt::Display for OxiheapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO Error: {}", e),
            Self::Json(e) => write!(f, "JSON Serialization/Deserialization Error: {}", e),
            Self::Serialization(s) => write!(f, "Serialization Error: {}", s),
            Self::Deserialization(s) => write!(f, "Deserialization Error: {}", s),
            Self::Storage(s) => write!(f, "Storage Error: {}", s),
            Self::RelationNotFound(s) => write!(f, "Relation not found: {}", s),
            Self::AlreadyExists { name } => write!(f, "Resource already exists: {}", name),
            Self::SchemaMismatch { declared, base } => write!(
                f,
                "Declared column count ({}) matches neither the base column count ({}) nor the annotated count ({})",
                declared,
                base,
                base + 2
            ),
            Self::LockUnavailable { table, holder } => write!(
                f,
                "Lock unavailable: table {} is locked by owner {}",
                table.0, holder
            ),
            Self::InvalidInput { message } => write!(f, "Invalid input: {}", message),
            Self::Configuration(s) => write!(f, "Configuration error: {}", s),
            Self::Internal(s) => write!(f, "Internal Error: {}", s),
        }
    }
}

impl std::error::Error for OxiheapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

// Manual From implementations
impl From<std::io::Error> for OxiheapError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for OxiheapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
