//! Snapshot types for persisting and restoring a stored table.
//!
//! Snapshots are the bridge between a store and persistent storage. Records
//! serialise with sorted fields, so the same table always produces the same
//! JSON.

use crate::{error::Result, ColumnName, Error, Record, Table, TableName, TableSchema, Value};
use serde::{Deserialize, Serialize};

/// Version of the snapshot format for future compatibility.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A point-in-time copy of one stored table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    /// Snapshot format version
    pub format_version: u32,
    /// Table name
    pub name: TableName,
    /// Column definitions and primary key
    pub schema: TableSchema,
    /// All rows
    pub records: Vec<Record>,
}

impl TableSnapshot {
    /// Create a new snapshot.
    pub fn new(name: impl Into<TableName>, schema: TableSchema, records: Vec<Record>) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            name: name.into(),
            schema,
            records,
        }
    }

    /// Number of rows.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;

        // Validate format version
        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(Error::InvalidSnapshot(format!(
                "unsupported snapshot format version: {} (max supported: {})",
                snapshot.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }

        Ok(snapshot)
    }
}

impl Table for TableSnapshot {
    fn column_names(&self) -> Vec<ColumnName> {
        self.schema.column_names()
    }

    fn records(&self) -> Vec<Record> {
        let columns = self.schema.column_names();
        self.records.iter().map(|r| r.conform(&columns)).collect()
    }

    fn column_values(&self, name: &str) -> Option<Vec<Value>> {
        self.schema.column(name)?;
        Some(
            self.records
                .iter()
                .map(|r| r.get(name).cloned().unwrap_or_default())
                .collect(),
        )
    }
}
