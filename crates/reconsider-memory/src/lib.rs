//! An in-process implementation of [`reconsider_core::Database`].
//!
//! Tables hold JSON documents keyed by their `id` field. Secondary indexes are
//! kept sorted on every write so ordered queries over an indexed field never
//! re-sort. The whole store can be written to and restored from a JSON file.

mod error;
mod index;
mod store;

pub use error::StoreError;
pub use store::{MemoryDatabase, Snapshot, TableSnapshot};
