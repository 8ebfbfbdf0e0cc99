//! Public API module for the Oxiheap engine.
//!
//! The main entry point is the `Oxiheap` struct: catalog management,
//! version writes, and forensic dirty scans.

pub mod db;

pub use db::{MaintenanceGuard, Oxiheap};
