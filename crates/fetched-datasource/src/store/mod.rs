//! Result-set implementations.
//!
//! Adapters work against the [`ResultSet`](crate::ResultSet) trait. This
//! module provides an in-memory implementation suited to tests, previews and
//! small datasets.

mod memory;

pub use memory::{MemoryResultSet, Transaction};
