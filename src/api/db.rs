use crate::core::catalog::Catalog;
use crate::core::common::types::{Schema, TableId, TransactionId, Tuple};
use crate::core::common::OxiheapError;
use crate::core::config::Config;
use crate::core::scan::{reconcile, DirtyScan};
use crate::core::storage::heap::{codec, TupleId};
use crate::core::transaction::lock_manager::{LockManager, LockMode, OwnerId};
use log::{debug, warn};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// The engine facade: table catalog, version writes, and forensic scans.
///
/// Writes stamp caller-supplied transaction ids onto row versions; the
/// engine never tracks whether those transactions committed. That is the
/// point: a dirty scan reports what is physically on the heap, not what
/// some snapshot would admit.
#[derive(Debug)]
pub struct Oxiheap {
    catalog: Catalog,
    locks: Arc<Mutex<LockManager>>,
    next_owner: AtomicU64,
    config: Config,
}

impl Oxiheap {
    /// Creates an engine from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::Configuration` if the configuration is
    /// invalid.
    pub fn new(config: Config) -> Result<Self, OxiheapError> {
        config.validate()?;
        Ok(Self {
            catalog: Catalog::new(config.page_capacity),
            locks: Arc::new(Mutex::new(LockManager::new())),
            next_owner: AtomicU64::new(1),
            config,
        })
    }

    /// Rebuilds an engine from a catalog schema snapshot. Tables come back
    /// with their declared shapes and empty heaps.
    ///
    /// # Errors
    ///
    /// Propagates configuration and snapshot-loading failures.
    pub fn import_schemas(path: &Path, config: Config) -> Result<Self, OxiheapError> {
        config.validate()?;
        Ok(Self {
            catalog: Catalog::import_schemas(path, config.page_capacity)?,
            locks: Arc::new(Mutex::new(LockManager::new())),
            next_owner: AtomicU64::new(1),
            config,
        })
    }

    /// Writes the catalog's table definitions to a JSON snapshot file.
    ///
    /// # Errors
    ///
    /// Propagates serialization and IO failures.
    pub fn export_schemas(&self, path: &Path) -> Result<(), OxiheapError> {
        self.catalog.export_schemas(path, self.config.snapshot_pretty)
    }

    /// Registers a table.
    ///
    /// # Errors
    ///
    /// Propagates catalog rejections (duplicate name, Null-typed column).
    pub fn create_table(&mut self, name: &str, schema: Schema) -> Result<TableId, OxiheapError> {
        self.catalog.create_table(name, schema)
    }

    /// Looks up a table id by name.
    #[must_use]
    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.catalog.table_id(name)
    }

    /// The base column layout of a table.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::RelationNotFound` for an unknown id.
    pub fn schema(&self, table: TableId) -> Result<&Schema, OxiheapError> {
        Ok(self.catalog.resolve(table)?.schema())
    }

    /// Number of row versions physically resident in a table, deleted
    /// versions included.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::RelationNotFound` for an unknown id.
    pub fn version_count(&self, table: TableId) -> Result<usize, OxiheapError> {
        Ok(self.catalog.resolve(table)?.heap().version_count())
    }

    /// Appends a new row version created by `creator` and returns its
    /// physical address.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::InvalidInput` if the tuple does not fit the
    /// table's schema (arity, nullability, column types).
    pub fn insert(
        &mut self,
        table: TableId,
        tuple: &Tuple,
        creator: TransactionId,
    ) -> Result<TupleId, OxiheapError> {
        let relation = self.catalog.resolve_mut(table)?;
        validate_against_schema(relation.schema(), tuple)?;
        let bytes = codec::encode(tuple)?;
        Ok(relation.heap_mut().insert(bytes, creator))
    }

    /// Stamps a row version as deleted by `deleter`. Returns `Ok(false)` if
    /// the version was already stamped. The version stays on the heap either
    /// way.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::InvalidInput` for a zero deleter id (zero is
    /// the live-version marker) and `OxiheapError::Storage` for an unknown
    /// address.
    pub fn delete(
        &mut self,
        table: TableId,
        id: TupleId,
        deleter: TransactionId,
    ) -> Result<bool, OxiheapError> {
        if deleter == TransactionId::NONE {
            return Err(OxiheapError::InvalidInput {
                message: "deleter transaction id zero is reserved for live versions".to_string(),
            });
        }
        self.catalog.resolve_mut(table)?.heap_mut().delete(id, deleter)
    }

    /// Replaces a row version: the old version is stamped deleted by `tx`
    /// and the replacement is appended as a new version created by `tx`.
    /// Both versions stay physically resident; this is how a logical row
    /// grows multiple physical versions. Returns `Ok(None)` if the old
    /// version was already stamped deleted.
    ///
    /// # Errors
    ///
    /// As for `insert` and `delete`.
    pub fn update(
        &mut self,
        table: TableId,
        id: TupleId,
        replacement: &Tuple,
        tx: TransactionId,
    ) -> Result<Option<TupleId>, OxiheapError> {
        if tx == TransactionId::NONE {
            return Err(OxiheapError::InvalidInput {
                message: "transaction id zero is reserved for live versions".to_string(),
            });
        }
        let relation = self.catalog.resolve_mut(table)?;
        validate_against_schema(relation.schema(), replacement)?;
        let bytes = codec::encode(replacement)?;
        if !relation.heap_mut().delete(id, tx)? {
            return Ok(None);
        }
        Ok(Some(relation.heap_mut().insert(bytes, tx)))
    }

    /// Opens a forensic scan over every physical row version of `table`,
    /// projected into `declared`.
    ///
    /// The declared arity must equal the table's base arity (plain output)
    /// or exceed it by exactly two (output annotated with each version's
    /// raw creator and deleter transaction ids). Resolution and
    /// reconciliation failures happen before any lock is taken; the shared
    /// lock is then acquired fail-fast and held until the cursor is closed
    /// or dropped.
    ///
    /// # Errors
    ///
    /// `RelationNotFound`, `SchemaMismatch`, or `LockUnavailable`.
    pub fn dirty_scan(
        &self,
        table: TableId,
        declared: Schema,
    ) -> Result<DirtyScan<'_>, OxiheapError> {
        let relation = self.catalog.resolve(table)?;
        let mode = reconcile(relation.schema().arity(), declared.arity())?;
        let owner = self.next_owner.fetch_add(1, Ordering::Relaxed);
        self.lock(owner, table, LockMode::Shared)?;
        debug!(
            "dirty scan open: table {} mode {:?} owner {}",
            table.0, mode, owner
        );
        Ok(DirtyScan::new(relation, declared, mode, Arc::clone(&self.locks), owner))
    }

    /// Takes the exclusive structural lock on a table, fail-fast. The guard
    /// releases it on drop. Open scans block this, and this blocks scans.
    ///
    /// # Errors
    ///
    /// `RelationNotFound` or `LockUnavailable`.
    pub fn maintenance_lock(&self, table: TableId) -> Result<MaintenanceGuard, OxiheapError> {
        self.catalog.resolve(table)?;
        let owner = self.next_owner.fetch_add(1, Ordering::Relaxed);
        self.lock(owner, table, LockMode::Exclusive)?;
        debug!("maintenance lock taken: table {} owner {}", table.0, owner);
        Ok(MaintenanceGuard { locks: Arc::clone(&self.locks), owner })
    }

    /// Drops every row version of a table. Requires the exclusive lock, so
    /// it fails fast while the table is locked, e.g. by an outstanding
    /// maintenance guard.
    ///
    /// # Errors
    ///
    /// `RelationNotFound` or `LockUnavailable`.
    pub fn truncate(&mut self, table: TableId) -> Result<(), OxiheapError> {
        self.catalog.resolve(table)?;
        let owner = self.next_owner.fetch_add(1, Ordering::Relaxed);
        self.lock(owner, table, LockMode::Exclusive)?;
        let outcome = self.catalog.resolve_mut(table).map(|rel| rel.heap_mut().truncate());
        let unlock = self.unlock(owner);
        outcome?;
        unlock
    }

    fn lock(&self, owner: OwnerId, table: TableId, mode: LockMode) -> Result<(), OxiheapError> {
        self.locks
            .lock()
            .map_err(|_| OxiheapError::Internal("lock manager mutex poisoned".to_string()))?
            .acquire(owner, table, mode)
    }

    fn unlock(&self, owner: OwnerId) -> Result<(), OxiheapError> {
        self.locks
            .lock()
            .map_err(|_| OxiheapError::Internal("lock manager mutex poisoned".to_string()))?
            .release_owner(owner);
        Ok(())
    }

    /// Test hook: overwrites one stored version's bytes with garbage.
    #[cfg(test)]
    pub(crate) fn corrupt_tuple(&mut self, table: TableId, id: TupleId) -> Result<(), OxiheapError> {
        self.catalog.resolve_mut(table)?.heap_mut().corrupt(id)
    }
}

impl Default for Oxiheap {
    fn default() -> Self {
        Self {
            catalog: Catalog::new(Config::default().page_capacity),
            locks: Arc::new(Mutex::new(LockManager::new())),
            next_owner: AtomicU64::new(1),
            config: Config::default(),
        }
    }
}

/// Guard for the exclusive structural lock on one table; released on drop.
#[derive(Debug)]
pub struct MaintenanceGuard {
    locks: Arc<Mutex<LockManager>>,
    owner: OwnerId,
}

impl Drop for MaintenanceGuard {
    fn drop(&mut self) {
        match self.locks.lock() {
            Ok(mut locks) => locks.release_owner(self.owner),
            Err(_) => warn!("maintenance lock release failed: lock manager mutex poisoned"),
        }
    }
}

/// Checks a tuple against a relation's base schema: arity, nullability, and
/// column types.
fn validate_against_schema(schema: &Schema, tuple: &Tuple) -> Result<(), OxiheapError> {
    if tuple.arity() != schema.arity() {
        return Err(OxiheapError::InvalidInput {
            message: format!(
                "tuple has {} columns, table has {}",
                tuple.arity(),
                schema.arity()
            ),
        });
    }
    for (i, col) in schema.columns.iter().enumerate() {
        let valid = tuple.validity()[i];
        if !valid {
            if !col.is_nullable {
                return Err(OxiheapError::InvalidInput {
                    message: format!("column '{}' is not nullable", col.name),
                });
            }
            continue;
        }
        let value_type = tuple.values()[i].get_type();
        if value_type != col.data_type {
            return Err(OxiheapError::InvalidInput {
                message: format!(
                    "column '{}' expects {:?}, got {:?}",
                    col.name, col.data_type, value_type
                ),
            });
        }
    }
    Ok(())
}
