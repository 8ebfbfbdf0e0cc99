pub mod codec;
pub mod table_heap;

pub use table_heap::{RawScan, StoredTuple, TableHeap, TupleId};
