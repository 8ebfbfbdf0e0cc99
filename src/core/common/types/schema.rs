use super::data_type::DataType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub is_nullable: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType, is_nullable: bool) -> Self {
        Self { name: name.into(), data_type, is_nullable }
    }
}

/// An ordered column layout. For a relation this is the base layout fixed at
/// creation; for a scan it is the caller-declared output shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Schema {
    pub columns: Vec<ColumnDef>,
}

impl Schema {
    #[must_use]
    pub const fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    /// Number of columns.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }
}
