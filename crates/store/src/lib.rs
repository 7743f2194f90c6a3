//! Persistence for assessment records.
//!
//! An in-memory table store receives rows from the risk engines' result
//! events and can be snapshotted to disk: bitcode rows, lz4-compressed,
//! framed with a checksummed header, written atomically.

pub mod atomic_write;
pub mod bridge;
pub mod data_store;
pub mod error;
pub mod snapshot_header;

pub use bridge::{SaveSnapshot, SnapshotPath, StorePlugin};
pub use data_store::DataStore;
pub use error::StoreError;
