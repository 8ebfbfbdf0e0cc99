use crate::core::common::types::TableId;
use crate::core::common::OxiheapError;
use log::debug;
use std::collections::{HashMap, HashSet};

/// Represents the strength of a table lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Read-intent lock: compatible with other shared holders, taken by
    /// scans to keep structural operations away while rows are being read.
    Shared,
    /// Structural lock: truncation and other destructive maintenance.
    Exclusive,
}

/// Identifies the holder of a table lock: a scan cursor or a maintenance
/// operation. This engine locks for structure, not for data, so holders are
/// lock tickets rather than transactions.
pub type OwnerId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
struct LockRequest {
    owner: OwnerId,
    mode: LockMode,
}

/// Table-granularity lock bookkeeping. Acquisition is fail-fast: a conflict
/// reports `LockUnavailable` immediately, it never queues or waits.
#[derive(Debug, Default)]
pub struct LockManager {
    /// Lock queue per table.
    lock_table: HashMap<TableId, Vec<LockRequest>>,
    /// Tables locked by each owner.
    owner_locks: HashMap<OwnerId, HashSet<TableId>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `owner` a lock on `table` in `mode`, or fails fast.
    ///
    /// Re-requests by the same owner are folded into the strongest mode it
    /// has asked for; they never conflict with themselves.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::LockUnavailable` if another owner holds an
    /// incompatible lock.
    pub fn acquire(
        &mut self,
        owner: OwnerId,
        table: TableId,
        mode: LockMode,
    ) -> Result<(), OxiheapError> {
        let holders = self.lock_table.entry(table).or_default();

        // Conflict check against *other* owners only.
        for existing in holders.iter() {
            if existing.owner == owner {
                continue;
            }
            if existing.mode == LockMode::Exclusive || mode == LockMode::Exclusive {
                debug!(
                    "lock conflict on table {}: owner {} wants {:?}, owner {} holds {:?}",
                    table.0, owner, mode, existing.owner, existing.mode
                );
                return Err(OxiheapError::LockUnavailable { table, holder: existing.owner });
            }
        }

        // No conflict; fold any lock this owner already holds into the
        // strongest requested mode.
        let mut already_exclusive = false;
        holders.retain(|existing| {
            if existing.owner == owner {
                if existing.mode == LockMode::Exclusive {
                    already_exclusive = true;
                }
                false
            } else {
                true
            }
        });

        let granted = if already_exclusive || mode == LockMode::Exclusive {
            LockMode::Exclusive
        } else {
            LockMode::Shared
        };
        holders.push(LockRequest { owner, mode: granted });
        self.owner_locks.entry(owner).or_default().insert(table);
        Ok(())
    }

    /// Releases every lock held by `owner`. A no-op for unknown owners.
    pub fn release_owner(&mut self, owner: OwnerId) {
        if let Some(tables) = self.owner_locks.remove(&owner) {
            for table in tables {
                if let Some(holders) = self.lock_table.get_mut(&table) {
                    holders.retain(|req| req.owner != owner);
                    if holders.is_empty() {
                        self.lock_table.remove(&table);
                    }
                }
            }
        }
    }

    /// Whether any owner currently holds a lock on `table`.
    #[must_use]
    pub fn is_locked(&self, table: TableId) -> bool {
        self.lock_table.get(&table).is_some_and(|holders| !holders.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T1: TableId = TableId(1);
    const T2: TableId = TableId(2);

    #[test]
    fn shared_locks_coexist_across_owners() {
        let mut manager = LockManager::new();
        assert!(manager.acquire(1, T1, LockMode::Shared).is_ok());
        assert!(manager.acquire(2, T1, LockMode::Shared).is_ok());
        assert_eq!(manager.lock_table.get(&T1).map_or(0, |v| v.len()), 2);
    }

    #[test]
    fn exclusive_conflicts_with_shared() {
        let mut manager = LockManager::new();
        manager.acquire(1, T1, LockMode::Shared).unwrap();

        match manager.acquire(2, T1, LockMode::Exclusive) {
            Err(OxiheapError::LockUnavailable { table, holder }) => {
                assert_eq!(table, T1);
                assert_eq!(holder, 1);
            }
            other => panic!("expected LockUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn shared_conflicts_with_exclusive() {
        let mut manager = LockManager::new();
        manager.acquire(1, T1, LockMode::Exclusive).unwrap();
        assert!(matches!(
            manager.acquire(2, T1, LockMode::Shared),
            Err(OxiheapError::LockUnavailable { holder: 1, .. })
        ));
    }

    #[test]
    fn exclusive_conflicts_with_exclusive() {
        let mut manager = LockManager::new();
        manager.acquire(1, T1, LockMode::Exclusive).unwrap();
        assert!(manager.acquire(2, T1, LockMode::Exclusive).is_err());
    }

    #[test]
    fn reacquisition_by_same_owner_folds_into_one_entry() {
        let mut manager = LockManager::new();
        manager.acquire(1, T1, LockMode::Shared).unwrap();
        manager.acquire(1, T1, LockMode::Shared).unwrap();
        assert_eq!(manager.lock_table.get(&T1).map_or(0, |v| v.len()), 1);
    }

    #[test]
    fn upgrade_succeeds_when_owner_is_alone() {
        let mut manager = LockManager::new();
        manager.acquire(1, T1, LockMode::Shared).unwrap();
        manager.acquire(1, T1, LockMode::Exclusive).unwrap();
        assert_eq!(manager.lock_table.get(&T1).unwrap()[0].mode, LockMode::Exclusive);
        // an exclusive holder re-requesting shared keeps exclusive
        manager.acquire(1, T1, LockMode::Shared).unwrap();
        assert_eq!(manager.lock_table.get(&T1).unwrap()[0].mode, LockMode::Exclusive);
    }

    #[test]
    fn upgrade_fails_while_another_shared_holder_exists() {
        let mut manager = LockManager::new();
        manager.acquire(1, T1, LockMode::Shared).unwrap();
        manager.acquire(2, T1, LockMode::Shared).unwrap();

        assert!(matches!(
            manager.acquire(1, T1, LockMode::Exclusive),
            Err(OxiheapError::LockUnavailable { holder: 2, .. })
        ));
        // the failed upgrade left both shared locks in place
        assert_eq!(manager.lock_table.get(&T1).unwrap().len(), 2);
    }

    #[test]
    fn release_owner_frees_only_that_owners_locks() {
        let mut manager = LockManager::new();
        manager.acquire(1, T1, LockMode::Shared).unwrap();
        manager.acquire(1, T2, LockMode::Exclusive).unwrap();
        manager.acquire(2, T1, LockMode::Shared).unwrap();

        manager.release_owner(1);

        assert!(!manager.is_locked(T2));
        assert!(manager.is_locked(T1));
        let remaining = manager.lock_table.get(&T1).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].owner, 2);
        // and the slot is reusable
        assert!(manager.acquire(3, T2, LockMode::Exclusive).is_ok());
    }

    #[test]
    fn release_of_unknown_owner_is_a_noop() {
        let mut manager = LockManager::new();
        manager.acquire(1, T1, LockMode::Shared).unwrap();
        manager.release_owner(99);
        assert!(manager.is_locked(T1));
    }
}
