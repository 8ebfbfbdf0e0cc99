use crate::core::common::types::{PageId, SlotId, TransactionId};
use crate::core::common::OxiheapError;

/// Physical address of one stored row version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TupleId {
    pub page: PageId,
    pub slot: SlotId,
}

/// One physically stored row version: the encoded column data plus the raw
/// transaction counters stamped by its writers.
///
/// `deleter` stays `TransactionId::NONE` while the version is live. Marking
/// a version deleted never removes it from the heap; reclamation is a
/// separate structural operation (`truncate`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTuple {
    pub data: Vec<u8>,
    pub creator: TransactionId,
    pub deleter: TransactionId,
}

#[derive(Debug)]
struct HeapPage {
    slots: Vec<StoredTuple>,
}

impl HeapPage {
    fn new(capacity: usize) -> Self {
        Self { slots: Vec::with_capacity(capacity) }
    }
}

/// A table's physical storage: pages of row-version slots.
///
/// Versions accumulate in insertion order. Updates and deletes only stamp
/// deleter ids; every version written since the last `truncate` stays
/// physically resident and reachable through `begin_raw_scan`.
#[derive(Debug)]
pub struct TableHeap {
    pages: Vec<HeapPage>,
    page_capacity: usize,
}

impl TableHeap {
    /// Creates an empty heap. `page_capacity` must have been validated to
    /// fit a slot id (`Config::validate` enforces this).
    pub fn new(page_capacity: usize) -> Self {
        Self { pages: Vec::new(), page_capacity }
    }

    /// Appends a new row version and returns its physical address.
    pub fn insert(&mut self, data: Vec<u8>, creator: TransactionId) -> TupleId {
        let needs_page =
            self.pages.last().map_or(true, |page| page.slots.len() >= self.page_capacity);
        if needs_page {
            self.pages.push(HeapPage::new(self.page_capacity));
        }
        let page_index = self.pages.len() - 1;
        let page = &mut self.pages[page_index];
        let slot_index = page.slots.len();
        page.slots.push(StoredTuple { data, creator, deleter: TransactionId::NONE });
        TupleId { page: PageId(page_index as u64), slot: SlotId(slot_index as u16) }
    }

    /// Stamps a version as deleted by `deleter`. Returns `Ok(false)` if the
    /// version already carries a deleter id; the existing stamp is kept.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::Storage` if the address does not exist.
    pub fn delete(&mut self, id: TupleId, deleter: TransactionId) -> Result<bool, OxiheapError> {
        let stored = self.slot_mut(id)?;
        if stored.deleter != TransactionId::NONE {
            return Ok(false);
        }
        stored.deleter = deleter;
        Ok(true)
    }

    /// Reads a version by physical address.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::Storage` if the address does not exist.
    pub fn get(&self, id: TupleId) -> Result<&StoredTuple, OxiheapError> {
        self.pages
            .get(id.page.0 as usize)
            .and_then(|page| page.slots.get(usize::from(id.slot.0)))
            .ok_or_else(|| {
                OxiheapError::Storage(format!(
                    "no stored tuple at page {} slot {}",
                    id.page.0, id.slot.0
                ))
            })
    }

    /// Drops every page. Callers must hold the table's exclusive lock.
    pub fn truncate(&mut self) {
        self.pages.clear();
    }

    /// Number of row versions physically resident, deleted ones included.
    #[must_use]
    pub fn version_count(&self) -> usize {
        self.pages.iter().map(|page| page.slots.len()).sum()
    }

    /// Opens an unfiltered iteration over every resident row version, in
    /// physical placement order. No visibility predicate is applied: live,
    /// deleted, and uncommitted versions are all yielded. Ending the scan is
    /// dropping the iterator.
    #[must_use]
    pub fn begin_raw_scan(&self) -> RawScan<'_> {
        RawScan { heap: self, page: 0, slot: 0 }
    }

    fn slot_mut(&mut self, id: TupleId) -> Result<&mut StoredTuple, OxiheapError> {
        self.pages
            .get_mut(id.page.0 as usize)
            .and_then(|page| page.slots.get_mut(usize::from(id.slot.0)))
            .ok_or_else(|| {
                OxiheapError::Storage(format!(
                    "no stored tuple at page {} slot {}",
                    id.page.0, id.slot.0
                ))
            })
    }

    /// Test hook: overwrites a version's stored bytes with garbage that can
    /// not decode, simulating on-heap corruption.
    #[cfg(test)]
    pub(crate) fn corrupt(&mut self, id: TupleId) -> Result<(), OxiheapError> {
        self.slot_mut(id)?.data = vec![0xFF, 0xFF, 0xFF, 0xFF];
        Ok(())
    }
}

/// Cursor state of one raw heap scan: the next (page, slot) pair to visit.
#[derive(Debug)]
pub struct RawScan<'a> {
    heap: &'a TableHeap,
    page: usize,
    slot: usize,
}

impl<'a> RawScan<'a> {
    /// Returns the next physical row version, or `None` once the heap is
    /// exhausted.
    pub fn next_version(&mut self) -> Option<(TupleId, &'a StoredTuple)> {
        while let Some(page) = self.heap.pages.get(self.page) {
            if let Some(stored) = page.slots.get(self.slot) {
                let id = TupleId {
                    page: PageId(self.page as u64),
                    slot: SlotId(self.slot as u16),
                };
                self.slot += 1;
                return Some((id, stored));
            }
            self.page += 1;
            self.slot = 0;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heap_with(capacity: usize, rows: usize) -> (TableHeap, Vec<TupleId>) {
        let mut heap = TableHeap::new(capacity);
        let ids = (0..rows)
            .map(|i| heap.insert(vec![i as u8], TransactionId(100 + i as u32)))
            .collect();
        (heap, ids)
    }

    #[test]
    fn insert_spills_onto_new_pages() {
        let (heap, ids) = heap_with(2, 5);
        assert_eq!(heap.version_count(), 5);
        assert_eq!(ids[0], TupleId { page: PageId(0), slot: SlotId(0) });
        assert_eq!(ids[2], TupleId { page: PageId(1), slot: SlotId(0) });
        assert_eq!(ids[4], TupleId { page: PageId(2), slot: SlotId(0) });
    }

    #[test]
    fn delete_stamps_once_and_keeps_the_version() {
        let (mut heap, ids) = heap_with(4, 1);
        assert!(heap.delete(ids[0], TransactionId(200)).unwrap());
        // second delete does not overwrite the first stamp
        assert!(!heap.delete(ids[0], TransactionId(300)).unwrap());
        let stored = heap.get(ids[0]).unwrap();
        assert_eq!(stored.deleter, TransactionId(200));
        assert_eq!(heap.version_count(), 1);
    }

    #[test]
    fn delete_of_unknown_address_is_a_storage_error() {
        let (mut heap, _) = heap_with(4, 1);
        let bogus = TupleId { page: PageId(7), slot: SlotId(0) };
        assert!(matches!(
            heap.delete(bogus, TransactionId(1)),
            Err(OxiheapError::Storage(_))
        ));
    }

    #[test]
    fn raw_scan_yields_every_version_including_deleted() {
        let (mut heap, ids) = heap_with(2, 5);
        heap.delete(ids[1], TransactionId(999)).unwrap();

        let mut scan = heap.begin_raw_scan();
        let mut seen = Vec::new();
        while let Some((id, stored)) = scan.next_version() {
            seen.push((id, stored.creator, stored.deleter));
        }
        assert_eq!(seen.len(), 5);
        assert!(seen.contains(&(ids[1], TransactionId(101), TransactionId(999))));
    }

    #[test]
    fn raw_scan_of_empty_heap_ends_immediately() {
        let heap = TableHeap::new(8);
        assert!(heap.begin_raw_scan().next_version().is_none());
    }

    #[test]
    fn truncate_empties_the_heap() {
        let (mut heap, _) = heap_with(2, 3);
        heap.truncate();
        assert_eq!(heap.version_count(), 0);
        assert!(heap.begin_raw_scan().next_version().is_none());
    }
}
