//! In-memory record store with compressed disk snapshots.
//!
//! Records are bitcode-encoded rows appended to named tables. The whole
//! store can be folded into a single snapshot file: bitcode payload,
//! lz4-compressed, framed with the checksummed snapshot header, and written
//! with an atomic rename.

use std::collections::BTreeMap;
use std::path::Path;

use bevy::prelude::*;
use bitcode::{Decode, DecodeOwned, Encode};

use crate::atomic_write::atomic_write;
use crate::error::StoreError;
use crate::snapshot_header::{frame, unframe, FLAG_COMPRESSED};

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

pub const TABLE_HEAT_ASSESSMENTS: &str = "heat_island_assessments";
pub const TABLE_TREE_RECOMMENDATIONS: &str = "tree_recommendations";
pub const TABLE_POLLUTION_ASSESSMENTS: &str = "microplastic_assessments";
pub const TABLE_ECO_ROUTES: &str = "eco_routes";
pub const TABLE_COMMUNITY_REPORTS: &str = "community_reports";
pub const TABLE_ALERTS: &str = "alerts";

/// Every table the store accepts records for.
pub const TABLES: [&str; 6] = [
    TABLE_HEAT_ASSESSMENTS,
    TABLE_TREE_RECOMMENDATIONS,
    TABLE_POLLUTION_ASSESSMENTS,
    TABLE_ECO_ROUTES,
    TABLE_COMMUNITY_REPORTS,
    TABLE_ALERTS,
];

// ---------------------------------------------------------------------------
// DataStore
// ---------------------------------------------------------------------------

/// Rows as raw encoded bytes, keyed by table name. Kept as a separate type
/// so the snapshot payload derives its codec directly.
#[derive(Debug, Default, Encode, Decode)]
struct TableSet {
    tables: BTreeMap<String, Vec<Vec<u8>>>,
}

#[derive(Resource, Debug, Default)]
pub struct DataStore {
    set: TableSet,
}

impl DataStore {
    /// Append a record to a table. Rejects table names outside [`TABLES`].
    pub fn insert<T: Encode>(&mut self, table: &str, record: &T) -> Result<(), StoreError> {
        if !TABLES.contains(&table) {
            return Err(StoreError::UnknownTable(table.to_string()));
        }
        self.set
            .tables
            .entry(table.to_string())
            .or_default()
            .push(bitcode::encode(record));
        Ok(())
    }

    /// Decode every record in a table, oldest first.
    pub fn records<T: DecodeOwned>(&self, table: &str) -> Result<Vec<T>, StoreError> {
        if !TABLES.contains(&table) {
            return Err(StoreError::UnknownTable(table.to_string()));
        }
        let Some(rows) = self.set.tables.get(table) else {
            return Ok(Vec::new());
        };
        rows.iter()
            .map(|bytes| bitcode::decode(bytes).map_err(StoreError::from))
            .collect()
    }

    pub fn count(&self, table: &str) -> usize {
        self.set.tables.get(table).map_or(0, Vec::len)
    }

    pub fn total_records(&self) -> usize {
        self.set.tables.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_records() == 0
    }

    // -- Snapshots ----------------------------------------------------------

    /// Serialize the store to framed snapshot bytes (lz4-compressed payload).
    pub fn to_snapshot_bytes(&self) -> Vec<u8> {
        let encoded = bitcode::encode(&self.set);
        let compressed = lz4_flex::compress_prepend_size(&encoded);
        frame(&compressed, FLAG_COMPRESSED, encoded.len() as u32)
    }

    /// Rebuild a store from framed snapshot bytes.
    pub fn from_snapshot_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        let (header, payload) = unframe(bytes)?;
        let encoded = if header.is_compressed() {
            lz4_flex::decompress_size_prepended(payload)
                .map_err(|e| StoreError::Decode(e.to_string()))?
        } else {
            payload.to_vec()
        };
        let set: TableSet = bitcode::decode(&encoded)?;
        Ok(Self { set })
    }

    /// Write a snapshot to disk with the write-rename pattern.
    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        atomic_write(path, &self.to_snapshot_bytes())?;
        Ok(())
    }

    /// Load a snapshot from disk.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        let bytes = std::fs::read(path)?;
        Self::from_snapshot_bytes(&bytes)
    }
}
