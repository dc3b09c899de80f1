//! # Tabsync Engine
//!
//! Keeps a relational table in line with an in-memory dataset.
//!
//! This crate holds the database-agnostic core: computing which rows were
//! inserted, updated or deleted between two versions of a keyed record
//! collection, and deciding which structural changes a stored table needs
//! to match a dataset.
//!
//! ## Design Principles
//!
//! - **No IO**: storage is reached only through the [`Store`] trait
//! - **Deterministic**: the same inputs produce the same change sets, in the same order
//! - **Synchronous**: every operation runs to completion before the next
//!
//! ## Core Concepts
//!
//! ### Records and keys
//!
//! A [`Record`] maps column names to scalar [`Value`]s. Projecting a record
//! onto a list of key columns gives its [`KeyTuple`]; two records with equal
//! key tuples are the same entity.
//!
//! ### Record diff
//!
//! [`records_changes`] classifies two collections into a [`ChangeSet`] of
//! inserts, updates and deletes. [`Differ`] also reports duplicate keys as
//! [`ConsistencyWarning`]s, and [`PagedDiffer`] computes the same result
//! while holding only one page of records at a time.
//!
//! ### Schema reconciliation
//!
//! A [`TableBinding`] remembers the schema and rows last pulled from a
//! [`Store`]. [`TableBinding::push`] renames the table, drops and adds
//! columns (inferring a [`ColumnType`] for each new one), reconciles types
//! and primary keys, then writes the record diff.
//!
//! ## Quick Start
//!
//! ```rust
//! use tabsync_engine::{
//!     record, ColumnDef, ColumnType, MemoryStore, Store, TableBinding, TableSchema, Value,
//! };
//!
//! // 1. A store with one table
//! let schema = TableSchema::new(
//!     vec![
//!         ColumnDef::new("id", ColumnType::Integer),
//!         ColumnDef::new("name", ColumnType::Text),
//!     ],
//!     vec!["id".to_string()],
//! );
//! let store = MemoryStore::new()
//!     .with_table("users", schema, vec![record! { "id" => 1, "name" => "Alice" }])
//!     .unwrap();
//!
//! // 2. Bind to it and edit the pulled dataset
//! let mut binding = TableBinding::open(store, "users").unwrap();
//! let mut data = binding.dataset();
//! data.push_record(record! { "id" => 2, "name" => "Bob" });
//! data.add_column("active", vec![Value::Bool(true), Value::Bool(false)]);
//!
//! // 3. Push the changes back
//! let report = binding.push(&data).unwrap();
//! assert_eq!(report.inserted, 1);
//! assert_eq!(report.added_columns, vec![ColumnDef::new("active", ColumnType::Boolean)]);
//!
//! let stored = binding.store().get_all_records("users").unwrap();
//! assert_eq!(stored.len(), 2);
//! ```
//!
//! ## Persistence
//!
//! [`TableSnapshot`] is the JSON form of one stored table; [`MemoryStore`]
//! can export and import it.

pub mod diff;
pub mod error;
pub mod reconcile;
pub mod record;
pub mod schema;
pub mod snapshot;
pub mod store;
pub mod table;
pub mod value;

// Re-export main types at crate root
pub use diff::{
    apply_changes, records_changes, ChangeSet, ConsistencyWarning, DiffOutcome, Differ,
    PagedDiffer, RecordSource, Side,
};
pub use error::{Error, ErrorKind};
pub use reconcile::{Baseline, PushReport, Rename, TableBinding};
pub use record::{column_names, KeyTuple, Record};
pub use schema::{ColumnDef, ColumnType, SchemaDrift, SchemaSnapshot, TableSchema, TypeMismatch};
pub use snapshot::{TableSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use store::{MemoryStore, Store, StoredTable, Transaction};
pub use table::{DataTable, Table};
pub use value::Value;

/// Type aliases for clarity
pub type ColumnName = String;
pub type TableName = String;
