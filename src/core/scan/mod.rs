//! The scan-and-project pipeline: unfiltered iteration over physical row
//! versions, arity reconciliation, and projection into the declared output
//! shape.

pub mod cursor;
pub mod projection;

pub use cursor::DirtyScan;
pub use projection::{project, reconcile, ProjectionMode, RawTupleVersion};
