//! Table catalog: name/id resolution and schema bookkeeping.

use crate::core::common::types::{DataType, Schema, TableId};
use crate::core::common::OxiheapError;
use crate::core::storage::heap::TableHeap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A table known to the catalog: identity, base column layout, and the heap
/// holding its physical row versions.
#[derive(Debug)]
pub struct Relation {
    id: TableId,
    name: String,
    schema: Schema,
    heap: TableHeap,
}

impl Relation {
    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn heap(&self) -> &TableHeap {
        &self.heap
    }

    pub(crate) fn heap_mut(&mut self) -> &mut TableHeap {
        &mut self.heap
    }
}

#[derive(Debug)]
pub struct Catalog {
    tables: HashMap<TableId, Relation>,
    by_name: HashMap<String, TableId>,
    next_table_id: u32,
    page_capacity: usize,
}

impl Catalog {
    pub fn new(page_capacity: usize) -> Self {
        Self {
            tables: HashMap::new(),
            by_name: HashMap::new(),
            next_table_id: 1,
            page_capacity,
        }
    }

    /// Registers a new table with an empty heap.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::AlreadyExists` for a duplicate name and
    /// `OxiheapError::InvalidInput` for a column typed `Null`.
    pub fn create_table(&mut self, name: &str, schema: Schema) -> Result<TableId, OxiheapError> {
        if self.by_name.contains_key(name) {
            return Err(OxiheapError::AlreadyExists { name: name.to_string() });
        }
        if let Some(col) = schema.columns.iter().find(|col| col.data_type == DataType::Null) {
            return Err(OxiheapError::InvalidInput {
                message: format!("column '{}' may not be typed Null", col.name),
            });
        }
        let id = TableId(self.next_table_id);
        self.next_table_id += 1;
        self.by_name.insert(name.to_string(), id);
        self.tables.insert(
            id,
            Relation {
                id,
                name: name.to_string(),
                schema,
                heap: TableHeap::new(self.page_capacity),
            },
        );
        Ok(id)
    }

    /// Resolves a table id to its relation.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::RelationNotFound` if the id is unknown.
    pub fn resolve(&self, table: TableId) -> Result<&Relation, OxiheapError> {
        self.tables
            .get(&table)
            .ok_or_else(|| OxiheapError::RelationNotFound(format!("table id {}", table.0)))
    }

    pub(crate) fn resolve_mut(&mut self, table: TableId) -> Result<&mut Relation, OxiheapError> {
        self.tables
            .get_mut(&table)
            .ok_or_else(|| OxiheapError::RelationNotFound(format!("table id {}", table.0)))
    }

    /// Looks up a table id by name.
    #[must_use]
    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.by_name.get(name).copied()
    }

    /// Writes the table definitions (ids, names, schemas; not row data) to
    /// a JSON snapshot file.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::Json` on serialization failure, `Io` on write
    /// failure.
    pub fn export_schemas(&self, path: &Path, pretty: bool) -> Result<(), OxiheapError> {
        let mut entries: Vec<TableEntry> = self
            .tables
            .values()
            .map(|rel| TableEntry {
                id: rel.id.0,
                name: rel.name.clone(),
                schema: rel.schema.clone(),
            })
            .collect();
        entries.sort_by_key(|entry| entry.id);
        let snapshot = CatalogSnapshot { tables: entries };
        let contents = if pretty {
            serde_json::to_string_pretty(&snapshot)?
        } else {
            serde_json::to_string(&snapshot)?
        };
        fs::write(path, contents)?;
        Ok(())
    }

    /// Rebuilds a catalog from a schema snapshot. Every table starts with an
    /// empty heap: the snapshot reproduces table shapes, not data.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::Io` if the file cannot be read, `Json` if it
    /// does not parse.
    pub fn import_schemas(path: &Path, page_capacity: usize) -> Result<Self, OxiheapError> {
        let contents = fs::read_to_string(path)?;
        let snapshot: CatalogSnapshot = serde_json::from_str(&contents)?;

        let mut catalog = Self::new(page_capacity);
        for entry in snapshot.tables {
            let id = TableId(entry.id);
            catalog.by_name.insert(entry.name.clone(), id);
            catalog.tables.insert(
                id,
                Relation {
                    id,
                    name: entry.name,
                    schema: entry.schema,
                    heap: TableHeap::new(page_capacity),
                },
            );
            catalog.next_table_id = catalog.next_table_id.max(entry.id + 1);
        }
        Ok(catalog)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogSnapshot {
    tables: Vec<TableEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TableEntry {
    id: u32,
    name: String,
    schema: Schema,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::common::types::ColumnDef;
    use tempfile::NamedTempFile;

    fn sample_schema() -> Schema {
        Schema::new(vec![
            ColumnDef::new("a", DataType::Integer, false),
            ColumnDef::new("b", DataType::Text, true),
        ])
    }

    #[test]
    fn create_and_resolve() {
        let mut catalog = Catalog::new(8);
        let id = catalog.create_table("t", sample_schema()).unwrap();
        let relation = catalog.resolve(id).unwrap();
        assert_eq!(relation.name(), "t");
        assert_eq!(relation.schema().arity(), 2);
        assert_eq!(relation.schema().get_column_index("b"), Some(1));
        assert_eq!(catalog.table_id("t"), Some(id));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut catalog = Catalog::new(8);
        catalog.create_table("t", sample_schema()).unwrap();
        assert!(matches!(
            catalog.create_table("t", sample_schema()),
            Err(OxiheapError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn null_typed_columns_are_rejected() {
        let mut catalog = Catalog::new(8);
        let schema = Schema::new(vec![ColumnDef::new("broken", DataType::Null, true)]);
        assert!(matches!(
            catalog.create_table("t", schema),
            Err(OxiheapError::InvalidInput { .. })
        ));
    }

    #[test]
    fn unknown_ids_do_not_resolve() {
        let catalog = Catalog::new(8);
        match catalog.resolve(TableId(404)) {
            Err(OxiheapError::RelationNotFound(msg)) => assert!(msg.contains("404")),
            other => panic!("expected RelationNotFound, got {:?}", other),
        }
    }

    #[test]
    fn snapshot_round_trip_restores_shapes_with_empty_heaps() {
        let mut catalog = Catalog::new(8);
        let id = catalog.create_table("t", sample_schema()).unwrap();
        catalog
            .resolve_mut(id)
            .unwrap()
            .heap_mut()
            .insert(vec![1, 2, 3], crate::core::common::types::TransactionId(5));

        let file = NamedTempFile::new().unwrap();
        catalog.export_schemas(file.path(), true).unwrap();

        let restored = Catalog::import_schemas(file.path(), 8).unwrap();
        let relation = restored.resolve(id).unwrap();
        assert_eq!(relation.schema(), &sample_schema());
        assert_eq!(relation.heap().version_count(), 0);

        // ids keep advancing past the imported ones
        let mut restored = restored;
        let next = restored.create_table("u", sample_schema()).unwrap();
        assert!(next.0 > id.0);
    }
}
