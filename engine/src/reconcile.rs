//! Schema reconciliation between a stored table and an in-memory dataset.
//!
//! A [`TableBinding`] pairs a store table with the state last pulled from
//! it. [`TableBinding::push`] brings the store in line with a dataset.
//!
//! # Pipeline
//!
//! 1. Validate the declared primary key against the data (no store calls)
//! 2. Rename the stored table if the declared name changed
//! 3. Drop stored columns missing from the data
//! 4. Add data columns missing from the store, with inferred types
//! 5. Migrate mismatched column types (store extension point)
//! 6. Replace the primary key if it changed (store extension point)
//! 7. Insert new rows, delete missing rows, update changed rows
//! 8. Re-pull the baseline
//!
//! When stored rows collide under a newly declared key (a key column added
//! in the same push is still null, say), rows are matched on the stored key
//! and the key replacement runs after step 7 instead.
//!
//! Each stage commits on its own. A failing store call aborts the rest of
//! the pipeline and nothing already applied is undone.

use crate::{
    error::Result, ColumnDef, ColumnName, ColumnType, DataTable, Differ, Error, KeyTuple, Record,
    SchemaDrift, SchemaSnapshot, Store, Table, TableName, TableSchema, TypeMismatch,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Where a push replaces the stored primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyStage {
    Unchanged,
    BeforeRecords,
    AfterRecords,
}

/// State of the stored table as of the last pull.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    /// Name the table is stored under
    pub name: TableName,
    pub schema: TableSchema,
    pub records: Vec<Record>,
}

impl Baseline {
    /// Set-level view of the stored schema.
    pub fn schema_snapshot(&self) -> SchemaSnapshot {
        SchemaSnapshot::from(&self.schema)
    }
}

/// A table rename applied by a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rename {
    pub from: TableName,
    pub to: TableName,
}

/// What a push changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushReport {
    pub renamed: Option<Rename>,
    pub dropped_columns: Vec<ColumnName>,
    pub added_columns: Vec<ColumnDef>,
    pub type_mismatches: Vec<TypeMismatch>,
    /// The declared primary key differed from the stored one
    pub primary_key_changed: bool,
    pub inserted: usize,
    pub deleted: usize,
    pub updated: usize,
}

impl PushReport {
    /// Check if the push changed nothing.
    pub fn is_noop(&self) -> bool {
        self == &Self::default()
    }
}

/// A store table bound to the state last pulled from it.
#[derive(Debug)]
pub struct TableBinding<S: Store> {
    store: S,
    name: TableName,
    primary_keys: Vec<ColumnName>,
    baseline: Baseline,
}

impl<S: Store> TableBinding<S> {
    /// Bind to a stored table, pulling its current state.
    ///
    /// The declared primary key starts as the stored one.
    pub fn open(store: S, name: impl Into<TableName>) -> Result<Self> {
        let name = name.into();
        let mut binding = Self {
            store,
            name: name.clone(),
            primary_keys: Vec::new(),
            baseline: Baseline {
                name,
                ..Baseline::default()
            },
        };
        binding.pull()?;
        binding.primary_keys = binding.baseline.schema.primary_keys.clone();
        Ok(binding)
    }

    /// Refresh the baseline from the store.
    ///
    /// Reads the table the baseline was stored under, so a pending rename
    /// is not lost.
    pub fn pull(&mut self) -> Result<()> {
        let name = self.baseline.name.clone();
        let schema = self.store.get_table_schema(&name)?;
        let records = self.store.get_all_records(&name)?;
        tracing::debug!(table = %name, rows = records.len(), "pulled table");
        self.baseline = Baseline {
            name,
            schema,
            records,
        };
        Ok(())
    }

    /// Declare a new table name, applied by the next push.
    pub fn rename(&mut self, name: impl Into<TableName>) {
        self.name = name.into();
    }

    /// Declare the primary key columns, applied by the next push.
    pub fn set_primary_keys(&mut self, keys: impl IntoIterator<Item = impl Into<ColumnName>>) {
        self.primary_keys = keys.into_iter().map(Into::into).collect();
    }

    /// The declared table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared primary key columns.
    pub fn primary_keys(&self) -> &[ColumnName] {
        &self.primary_keys
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// The baseline as an editable dataset.
    pub fn dataset(&self) -> DataTable {
        let mut table = DataTable::new(self.baseline.schema.column_names());
        for record in &self.baseline.records {
            table.push_record(record.clone());
        }
        table
    }

    pub fn name_changed(&self) -> bool {
        self.name != self.baseline.name
    }

    /// Stored columns the data no longer has.
    pub fn missing_columns(&self, table: &impl Table) -> Vec<ColumnName> {
        self.drift(table).missing
    }

    /// Data columns the store does not have yet.
    pub fn extra_columns(&self, table: &impl Table) -> Vec<ColumnName> {
        self.drift(table).extra
    }

    /// Columns on both sides whose stored type no longer covers the data.
    pub fn type_mismatches(&self, table: &impl Table) -> Vec<TypeMismatch> {
        self.baseline
            .schema
            .columns
            .iter()
            .filter_map(|def| {
                let values = table.column_values(&def.name)?;
                TypeMismatch::detect(&def.name, def.column_type, &values)
            })
            .collect()
    }

    pub fn primary_keys_different(&self) -> bool {
        let declared: BTreeSet<&ColumnName> = self.primary_keys.iter().collect();
        let stored: BTreeSet<&ColumnName> = self.baseline.schema.primary_keys.iter().collect();
        declared != stored
    }

    /// Data records whose primary key is not in the baseline.
    pub fn new_records(&self, table: &impl Table) -> Result<Vec<Record>> {
        let stored = self.baseline_keys();
        Ok(self
            .current_keyed(table)?
            .into_iter()
            .filter(|(key, _)| !stored.contains(key))
            .map(|(_, record)| record)
            .collect())
    }

    /// Key-only records for baseline keys the data no longer has.
    pub fn missing_records(&self, table: &impl Table) -> Result<Vec<Record>> {
        let current: HashSet<KeyTuple> = self
            .current_keyed(table)?
            .into_iter()
            .map(|(key, _)| key)
            .collect();

        let mut seen = HashSet::new();
        Ok(self
            .baseline
            .records
            .iter()
            .map(|r| self.baseline_key(r))
            .filter(|key| !current.contains(key) && seen.insert(key.clone()))
            .map(|key| key.to_record(&self.primary_keys))
            .collect())
    }

    /// Full data records whose primary key is also in the baseline.
    pub fn matching_records(&self, table: &impl Table) -> Result<Vec<Record>> {
        let stored = self.baseline_keys();
        Ok(self
            .current_keyed(table)?
            .into_iter()
            .filter(|(key, _)| stored.contains(key))
            .map(|(_, record)| record)
            .collect())
    }

    /// Reconcile the store with `table` and re-pull the baseline.
    pub fn push(&mut self, table: &impl Table) -> Result<PushReport> {
        let columns = table.column_names();
        let records = table.records();
        self.validate(&columns, &records)?;
        let key_stage = self.key_stage(&columns, &records)?;

        let mut report = PushReport::default();

        if self.name_changed() {
            let from = self.baseline.name.clone();
            self.store.rename_table(&from, &self.name)?;
            tracing::info!(%from, to = %self.name, "renamed table");
            self.baseline.name = self.name.clone();
            report.renamed = Some(Rename {
                from,
                to: self.name.clone(),
            });
        }
        let name = self.name.clone();

        let drift = SchemaDrift::between(&self.baseline.schema_snapshot(), &columns);

        for column in drift.missing {
            self.store.drop_column(&name, &column)?;
            tracing::info!(table = %name, %column, "dropped column");
            self.baseline.schema.columns.retain(|c| c.name != column);
            report.dropped_columns.push(column);
        }

        for column in drift.extra {
            let values = table.column_values(&column).unwrap_or_default();
            let column_type = ColumnType::infer(&values);
            self.store.add_column(&name, &column, column_type)?;
            tracing::info!(table = %name, %column, %column_type, "added column");
            let def = ColumnDef::new(column, column_type);
            self.baseline.schema.columns.push(def.clone());
            report.added_columns.push(def);
        }

        let mismatches = self.type_mismatches(table);
        if mismatches.is_empty() {
            tracing::debug!(table = %name, "column types match");
        } else {
            self.store.alter_column_types(&name, &mismatches)?;
            tracing::info!(table = %name, count = mismatches.len(), "reconciled column types");
            report.type_mismatches = mismatches;
        }

        match key_stage {
            KeyStage::Unchanged => tracing::debug!(table = %name, "primary key unchanged"),
            KeyStage::BeforeRecords => self.replace_primary_key(&name, &mut report)?,
            KeyStage::AfterRecords => {
                tracing::debug!(table = %name, "matching rows on the stored primary key")
            }
        }
        let row_keys = match key_stage {
            KeyStage::AfterRecords => self.baseline.schema.primary_keys.clone(),
            _ => self.primary_keys.clone(),
        };

        // Baseline rows are compared on the current column set
        let stored: Vec<Record> = self
            .baseline
            .records
            .iter()
            .map(|r| r.conform(&columns))
            .collect();
        let outcome = Differ::new(row_keys.clone()).diff(&stored, &records)?;
        outcome.log_warnings();
        let changes = outcome.changes;

        if !changes.insert.is_empty() {
            self.store.insert_records(&name, &changes.insert)?;
            tracing::info!(table = %name, rows = changes.insert.len(), "inserted records");
            self.baseline
                .records
                .extend(changes.insert.iter().map(|r| r.conform(&columns)));
            report.inserted = changes.insert.len();
        }

        if !changes.delete.is_empty() {
            let keys = changes
                .delete
                .iter()
                .map(|r| r.project(&row_keys))
                .collect::<Result<Vec<_>>>()?;
            self.store.delete_records_by_key_values(&name, &keys)?;
            tracing::info!(table = %name, rows = keys.len(), "deleted records");
            let deleted: HashSet<KeyTuple> =
                changes.delete.iter().map(|r| key_of(r, &row_keys)).collect();
            self.baseline
                .records
                .retain(|r| !deleted.contains(&key_of(r, &row_keys)));
            report.deleted = keys.len();
        }

        if !changes.update.is_empty() {
            self.store.update_records(&name, &changes.update)?;
            tracing::info!(table = %name, rows = changes.update.len(), "updated records");
            let updates: HashMap<KeyTuple, &Record> = changes
                .update
                .iter()
                .map(|r| (key_of(r, &row_keys), r))
                .collect();
            for row in &mut self.baseline.records {
                if let Some(update) = updates.get(&key_of(row, &row_keys)) {
                    *row = update.conform(&columns);
                }
            }
            report.updated = changes.update.len();
        }

        if key_stage == KeyStage::AfterRecords {
            self.replace_primary_key(&name, &mut report)?;
        }

        self.pull()?;
        Ok(report)
    }

    fn replace_primary_key(&mut self, table: &str, report: &mut PushReport) -> Result<()> {
        let old = self.baseline.schema.primary_keys.clone();
        self.store.replace_primary_key(table, &old, &self.primary_keys)?;
        tracing::info!(%table, ?old, new = ?self.primary_keys, "replaced primary key");
        self.baseline.schema.primary_keys = self.primary_keys.clone();
        report.primary_key_changed = true;
        Ok(())
    }

    /// Decide when the declared key replaces the stored one.
    ///
    /// Stored rows that collide under the declared key must be rewritten
    /// first, which needs a stored key that still identifies every data
    /// record. Fails before any store call when neither key works.
    fn key_stage(&self, columns: &[ColumnName], records: &[Record]) -> Result<KeyStage> {
        if !self.primary_keys_different() {
            return Ok(KeyStage::Unchanged);
        }
        let stored = self.baseline.records.iter().map(|r| self.baseline_key(r));
        let Some(collision) = first_duplicate(stored) else {
            return Ok(KeyStage::BeforeRecords);
        };

        let old = &self.baseline.schema.primary_keys;
        let old_identifies = !old.is_empty()
            && old.iter().all(|k| columns.contains(k))
            && records
                .iter()
                .map(|r| r.key_tuple(old))
                .collect::<Result<Vec<_>>>()
                .is_ok_and(|keys| first_duplicate(keys).is_none());
        let declared = records
            .iter()
            .map(|r| r.key_tuple(&self.primary_keys))
            .collect::<Result<Vec<_>>>()?;

        match first_duplicate(declared) {
            Some(key) => Err(Error::DuplicatePrimaryKey {
                table: self.name.clone(),
                key: key.to_string(),
            }),
            None if old_identifies => Ok(KeyStage::AfterRecords),
            None => Err(Error::DuplicatePrimaryKey {
                table: self.name.clone(),
                key: collision.to_string(),
            }),
        }
    }

    /// Fail before any store call if the data cannot be keyed.
    fn validate(&self, columns: &[ColumnName], records: &[Record]) -> Result<()> {
        if self.primary_keys.is_empty() {
            return Err(Error::MissingPrimaryKey(self.name.clone()));
        }
        if let Some(column) = self.primary_keys.iter().find(|k| !columns.contains(k)) {
            return Err(Error::MissingKeyColumn {
                column: column.clone(),
            });
        }
        for record in records {
            record.key_tuple(&self.primary_keys)?;
        }
        Ok(())
    }

    fn drift(&self, table: &impl Table) -> SchemaDrift {
        SchemaDrift::between(&self.baseline.schema_snapshot(), &table.column_names())
    }

    /// Key of a baseline row under the declared primary key. Key columns
    /// the row lacks read as `Null`.
    fn baseline_key(&self, record: &Record) -> KeyTuple {
        key_of(record, &self.primary_keys)
    }

    fn baseline_keys(&self) -> HashSet<KeyTuple> {
        self.baseline
            .records
            .iter()
            .map(|r| self.baseline_key(r))
            .collect()
    }

    fn current_keyed(&self, table: &impl Table) -> Result<Vec<(KeyTuple, Record)>> {
        table
            .records()
            .into_iter()
            .map(|r| Ok((r.key_tuple(&self.primary_keys)?, r)))
            .collect()
    }
}

/// Key of `record` under `keys`, reading absent columns as `Null`.
fn key_of(record: &Record, keys: &[ColumnName]) -> KeyTuple {
    KeyTuple(
        keys.iter()
            .map(|k| record.get(k).cloned().unwrap_or_default())
            .collect(),
    )
}

fn first_duplicate(keys: impl IntoIterator<Item = KeyTuple>) -> Option<KeyTuple> {
    let mut seen = HashSet::new();
    keys.into_iter().find(|key| !seen.insert(key.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{record, MemoryStore, Value};

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_table(
                "items",
                TableSchema::new(
                    vec![
                        ColumnDef::new("id", ColumnType::Integer),
                        ColumnDef::new("a", ColumnType::Integer),
                        ColumnDef::new("b", ColumnType::Text),
                        ColumnDef::new("c", ColumnType::Float),
                    ],
                    vec!["id".to_string()],
                ),
                vec![
                    record! { "id" => 1, "a" => 10, "b" => "one", "c" => 1.5 },
                    record! { "id" => 2, "a" => 20, "b" => "two", "c" => 2.5 },
                    record! { "id" => 3, "a" => 30, "b" => "three", "c" => 3.5 },
                ],
            )
            .unwrap()
    }

    fn binding() -> TableBinding<MemoryStore> {
        TableBinding::open(store(), "items").unwrap()
    }

    #[test]
    fn open_pulls_baseline() {
        let binding = binding();
        assert_eq!(binding.name(), "items");
        assert_eq!(binding.primary_keys(), ["id"]);
        assert_eq!(binding.baseline().records.len(), 3);
        assert!(!binding.name_changed());
        assert!(!binding.primary_keys_different());
    }

    #[test]
    fn open_unknown_table_fails() {
        assert!(matches!(
            TableBinding::open(MemoryStore::new(), "nope"),
            Err(Error::TableNotFound(_))
        ));
    }

    #[test]
    fn unchanged_dataset_is_noop() {
        let mut binding = binding();
        let data = binding.dataset();
        let report = binding.push(&data).unwrap();
        assert!(report.is_noop());
    }

    #[test]
    fn drop_and_add_columns() {
        let mut binding = binding();
        let mut data = binding.dataset();
        data.drop_column("a");
        data.add_column("d", vec![Value::Bool(true), Value::Bool(false)]);

        assert_eq!(binding.missing_columns(&data), vec!["a"]);
        assert_eq!(binding.extra_columns(&data), vec!["d"]);

        let report = binding.push(&data).unwrap();
        assert_eq!(report.dropped_columns, vec!["a"]);
        assert_eq!(
            report.added_columns,
            vec![ColumnDef::new("d", ColumnType::Boolean)]
        );

        let schema = binding.store().get_table_schema("items").unwrap();
        assert_eq!(schema.column_names(), vec!["id", "b", "c", "d"]);
        assert_eq!(
            binding.store().get_all_records("items").unwrap()[0],
            record! { "id" => 1, "b" => "one", "c" => 1.5, "d" => true }
        );
        // Rows 1 and 2 got values for the new column, row 3 stayed null
        assert_eq!(report.updated, 2);
    }

    #[test]
    fn record_changes_are_applied() {
        let mut binding = binding();
        let mut data = binding.dataset();
        data.set(0, "b", "uno");
        data.retain(|r| r.get("id") != Some(&Value::Int(2)));
        data.push_record(record! { "id" => 4, "a" => 40, "b" => "four", "c" => 4.5 });

        assert_eq!(binding.new_records(&data).unwrap().len(), 1);
        assert_eq!(
            binding.missing_records(&data).unwrap(),
            vec![record! { "id" => 2 }]
        );
        assert_eq!(binding.matching_records(&data).unwrap().len(), 2);

        let report = binding.push(&data).unwrap();
        assert_eq!((report.inserted, report.deleted, report.updated), (1, 1, 1));

        let mut stored = binding.store().get_all_records("items").unwrap();
        stored.sort();
        let mut expected = data.records();
        expected.sort();
        assert_eq!(stored, expected);
        assert_eq!(binding.baseline().records.len(), 3);
    }

    #[test]
    fn rename_is_applied_and_baseline_follows() {
        let mut binding = binding();
        binding.rename("goods");
        assert!(binding.name_changed());

        let data = binding.dataset();
        let report = binding.push(&data).unwrap();
        assert_eq!(
            report.renamed,
            Some(Rename {
                from: "items".into(),
                to: "goods".into()
            })
        );
        assert!(binding.store().table("items").is_none());
        assert_eq!(binding.baseline().name, "goods");
        assert!(!binding.name_changed());
    }

    #[test]
    fn pull_after_rename_reads_stored_name() {
        let mut binding = binding();
        binding.rename("goods");
        binding.pull().unwrap();
        assert_eq!(binding.baseline().name, "items");
    }

    #[test]
    fn type_mismatch_reported_and_migrated() {
        let mut binding = binding();
        let mut data = binding.dataset();
        data.set(0, "a", "ten");

        let mismatches = binding.type_mismatches(&data);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].inferred, ColumnType::Text);

        let report = binding.push(&data).unwrap();
        assert_eq!(report.type_mismatches, mismatches);
        assert_eq!(
            binding.baseline().schema.column_type("a"),
            Some(ColumnType::Text)
        );
    }

    #[test]
    fn primary_key_change_is_applied() {
        let mut binding = binding();
        binding.set_primary_keys(["id", "b"]);
        assert!(binding.primary_keys_different());

        let data = binding.dataset();
        let report = binding.push(&data).unwrap();
        assert!(report.primary_key_changed);
        assert_eq!(binding.baseline().schema.primary_keys, vec!["id", "b"]);
        assert!(!binding.primary_keys_different());
    }

    #[test]
    fn primary_key_moves_to_added_column() {
        let mut binding = binding();
        binding.set_primary_keys(["uid"]);
        let mut data = binding.dataset();
        data.add_column("uid", [100, 200, 300].map(Value::Int));

        let report = binding.push(&data).unwrap();
        assert!(report.primary_key_changed);
        assert_eq!(report.updated, 3);

        let schema = binding.store().get_table_schema("items").unwrap();
        assert_eq!(schema.primary_keys, vec!["uid"]);
        assert_eq!(
            binding.store().get_all_records("items").unwrap()[1].get("uid"),
            Some(&Value::Int(200))
        );
        assert!(binding.push(&data).unwrap().is_noop());
    }

    #[test]
    fn primary_key_moves_to_column_fixed_in_same_push() {
        let mut binding = binding();
        let mut data = binding.dataset();
        data.set(1, "a", 10);
        binding.push(&data).unwrap();

        binding.set_primary_keys(["a"]);
        data.set(1, "a", 20);
        let report = binding.push(&data).unwrap();
        assert!(report.primary_key_changed);
        assert_eq!(report.updated, 1);

        let mut stored = binding.store().get_all_records("items").unwrap();
        stored.sort();
        let mut expected = data.records();
        expected.sort();
        assert_eq!(stored, expected);
        assert_eq!(binding.baseline().schema.primary_keys, vec!["a"]);
    }

    #[test]
    fn colliding_primary_key_fails_before_store_calls() {
        let mut binding = binding();
        binding.set_primary_keys(["uid"]);
        let mut data = binding.dataset();
        data.add_column("uid", [1, 1, 2].map(Value::Int));

        let err = binding.push(&data).unwrap_err();
        assert!(matches!(err, Error::DuplicatePrimaryKey { ref key, .. } if key == "(1)"));
        let schema = binding.store().get_table_schema("items").unwrap();
        assert!(schema.column("uid").is_none());
        assert_eq!(schema.primary_keys, vec!["id"]);
    }

    #[test]
    fn missing_primary_key_fails_fast() {
        let mut binding = binding();
        binding.set_primary_keys(Vec::<String>::new());
        binding.rename("goods");

        let data = binding.dataset();
        assert!(matches!(
            binding.push(&data),
            Err(Error::MissingPrimaryKey(_))
        ));
        // Validation failed before the rename
        assert!(binding.store().table("items").is_some());
    }

    #[test]
    fn missing_key_column_fails_fast() {
        let mut binding = binding();
        let mut data = binding.dataset();
        data.drop_column("id");

        let err = binding.push(&data).unwrap_err();
        assert!(matches!(err, Error::MissingKeyColumn { column } if column == "id"));
        assert_eq!(
            binding.store().get_table_schema("items").unwrap().columns.len(),
            4
        );
    }

    #[test]
    fn push_through_borrowed_store() {
        let mut store = store();
        {
            let mut binding = TableBinding::open(&mut store, "items").unwrap();
            let mut data = binding.dataset();
            data.push_record(record! { "id" => 9, "a" => 90 });
            binding.push(&data).unwrap();
        }
        assert_eq!(store.get_all_records("items").unwrap().len(), 4);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeMap;

        fn arb_rows() -> impl Strategy<Value = BTreeMap<i64, (i64, bool)>> {
            prop::collection::btree_map(0i64..12, (0i64..4, any::<bool>()), 0..10)
        }

        fn dataset(rows: &BTreeMap<i64, (i64, bool)>) -> DataTable {
            DataTable::from_records(
                rows.iter()
                    .map(|(&id, &(a, flag))| record! { "id" => id, "a" => a, "flag" => flag }),
            )
        }

        proptest! {
            #[test]
            fn prop_push_converges(first in arb_rows(), second in arb_rows()) {
                let mut binding = binding();
                for rows in [&first, &second] {
                    let mut data = dataset(rows);
                    if data.columns().is_empty() {
                        data = DataTable::new(["id", "a", "flag"]);
                    }
                    binding.push(&data).unwrap();

                    let mut stored = binding.store().get_all_records("items").unwrap();
                    stored.sort();
                    let mut expected = data.records();
                    expected.sort();
                    prop_assert_eq!(stored, expected);

                    // Pushing the same data again changes nothing
                    prop_assert!(binding.push(&data).unwrap().is_noop());
                }
            }
        }
    }
}
