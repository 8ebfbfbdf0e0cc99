use super::projection::{project, ProjectionMode, RawTupleVersion};
use crate::core::catalog::Relation;
use crate::core::common::types::{Schema, TableId, Tuple};
use crate::core::common::OxiheapError;
use crate::core::storage::heap::{codec, RawScan};
use crate::core::transaction::lock_manager::{LockManager, OwnerId};
use log::{debug, warn};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Open,
    Exhausted,
}

/// A forensic scan over every physical row version of one table.
///
/// The cursor pulls raw versions from the heap in placement order with no
/// visibility predicate, decodes each through the row codec, and projects it
/// into the declared output shape. It holds a shared table lock for its
/// whole lifetime; the lock is released exactly once, by `close` or by
/// `Drop` on early termination and error paths.
///
/// A storage or codec failure is fatal to the scan: the error is yielded
/// once, rows already yielded stay valid, and no further rows are produced.
pub struct DirtyScan<'a> {
    raw: RawScan<'a>,
    mode: ProjectionMode,
    declared: Schema,
    base_arity: usize,
    table: TableId,
    locks: Arc<Mutex<LockManager>>,
    owner: OwnerId,
    state: CursorState,
    released: bool,
}

impl<'a> DirtyScan<'a> {
    /// Builds an open cursor. The caller has already resolved the relation,
    /// reconciled the declared schema, and acquired the shared lock under
    /// `owner`.
    pub(crate) fn new(
        relation: &'a Relation,
        declared: Schema,
        mode: ProjectionMode,
        locks: Arc<Mutex<LockManager>>,
        owner: OwnerId,
    ) -> Self {
        Self {
            raw: relation.heap().begin_raw_scan(),
            mode,
            declared,
            base_arity: relation.schema().arity(),
            table: relation.id(),
            locks,
            owner,
            state: CursorState::Open,
            released: false,
        }
    }

    /// The reconciled projection mode of this scan.
    #[must_use]
    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    /// The caller-declared output schema.
    #[must_use]
    pub fn output_schema(&self) -> &Schema {
        &self.declared
    }

    /// Ends the scan and releases the table lock. Consuming the cursor makes
    /// a second close unrepresentable; early terminators may simply drop the
    /// cursor instead.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::Internal` if the lock manager mutex is
    /// poisoned; the release still counts as spent.
    pub fn close(mut self) -> Result<(), OxiheapError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), OxiheapError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| OxiheapError::Internal("lock manager mutex poisoned".to_string()))?;
        locks.release_owner(self.owner);
        debug!("dirty scan closed: table {} owner {}", self.table.0, self.owner);
        Ok(())
    }
}

impl Iterator for DirtyScan<'_> {
    type Item = Result<Tuple, OxiheapError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state != CursorState::Open {
            return None;
        }
        let Some((id, stored)) = self.raw.next_version() else {
            self.state = CursorState::Exhausted;
            return None;
        };
        let decoded = codec::decode(&stored.data).and_then(|tuple| {
            if tuple.arity() == self.base_arity {
                Ok(tuple)
            } else {
                Err(OxiheapError::Storage(format!(
                    "stored tuple at page {} slot {} has {} columns, relation has {}",
                    id.page.0,
                    id.slot.0,
                    tuple.arity(),
                    self.base_arity
                )))
            }
        });
        match decoded {
            Ok(tuple) => Some(Ok(project(
                RawTupleVersion { tuple, creator: stored.creator, deleter: stored.deleter },
                self.mode,
            ))),
            Err(e) => {
                warn!(
                    "dirty scan of table {} aborted at page {} slot {}: {}",
                    self.table.0, id.page.0, id.slot.0, e
                );
                self.state = CursorState::Exhausted;
                Some(Err(e))
            }
        }
    }
}

impl Drop for DirtyScan<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("dirty scan lock release failed: {}", e);
        }
    }
}

impl std::fmt::Debug for DirtyScan<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirtyScan")
            .field("table", &self.table)
            .field("mode", &self.mode)
            .field("owner", &self.owner)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
