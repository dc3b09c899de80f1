//! Store - the backing storage collaborator.
//!
//! [`Store`] is everything the reconciler needs from a backing store. Each
//! call either commits or fails; nothing is rolled back across calls.
//! [`MemoryStore`] is an in-memory implementation used by tests and as a
//! reference for real backends.

use crate::{
    error::Result, ColumnDef, ColumnName, ColumnType, Error, Record, TableName, TableSchema,
    TableSnapshot, TypeMismatch,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Operations consumed from a backing store.
pub trait Store {
    /// Columns, column types and primary key of a table.
    fn get_table_schema(&self, table: &str) -> Result<TableSchema>;

    /// Every row of a table.
    fn get_all_records(&self, table: &str) -> Result<Vec<Record>>;

    fn rename_table(&mut self, from: &str, to: &str) -> Result<()>;

    fn drop_column(&mut self, table: &str, column: &str) -> Result<()>;

    fn add_column(&mut self, table: &str, column: &str, column_type: ColumnType) -> Result<()>;

    fn insert_records(&mut self, table: &str, records: &[Record]) -> Result<()>;

    /// Write full records over the rows with the same primary key.
    fn update_records(&mut self, table: &str, records: &[Record]) -> Result<()>;

    /// Delete every row matching all fields of one of `keys`.
    ///
    /// Must be atomic: either every matching row is deleted or none is.
    fn delete_records_by_key_values(&mut self, table: &str, keys: &[Record]) -> Result<()>;

    /// Migrate columns whose stored type no longer fits the data.
    ///
    /// The default does nothing.
    fn alter_column_types(&mut self, table: &str, mismatches: &[TypeMismatch]) -> Result<()> {
        tracing::debug!(
            table,
            count = mismatches.len(),
            "column type migration not supported by store, skipping"
        );
        Ok(())
    }

    /// Replace the table's primary key constraint.
    ///
    /// The default does nothing.
    fn replace_primary_key(
        &mut self,
        table: &str,
        old: &[ColumnName],
        new: &[ColumnName],
    ) -> Result<()> {
        tracing::debug!(
            table,
            ?old,
            ?new,
            "primary key replacement not supported by store, skipping"
        );
        Ok(())
    }
}

impl<S: Store + ?Sized> Store for &mut S {
    fn get_table_schema(&self, table: &str) -> Result<TableSchema> {
        (**self).get_table_schema(table)
    }

    fn get_all_records(&self, table: &str) -> Result<Vec<Record>> {
        (**self).get_all_records(table)
    }

    fn rename_table(&mut self, from: &str, to: &str) -> Result<()> {
        (**self).rename_table(from, to)
    }

    fn drop_column(&mut self, table: &str, column: &str) -> Result<()> {
        (**self).drop_column(table, column)
    }

    fn add_column(&mut self, table: &str, column: &str, column_type: ColumnType) -> Result<()> {
        (**self).add_column(table, column, column_type)
    }

    fn insert_records(&mut self, table: &str, records: &[Record]) -> Result<()> {
        (**self).insert_records(table, records)
    }

    fn update_records(&mut self, table: &str, records: &[Record]) -> Result<()> {
        (**self).update_records(table, records)
    }

    fn delete_records_by_key_values(&mut self, table: &str, keys: &[Record]) -> Result<()> {
        (**self).delete_records_by_key_values(table, keys)
    }

    fn alter_column_types(&mut self, table: &str, mismatches: &[TypeMismatch]) -> Result<()> {
        (**self).alter_column_types(table, mismatches)
    }

    fn replace_primary_key(
        &mut self,
        table: &str,
        old: &[ColumnName],
        new: &[ColumnName],
    ) -> Result<()> {
        (**self).replace_primary_key(table, old, new)
    }
}

/// A table held by [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTable {
    pub schema: TableSchema,
    pub records: Vec<Record>,
}

impl StoredTable {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            records: Vec::new(),
        }
    }

    fn check_columns(&self, table: &str, record: &Record) -> Result<()> {
        match record.columns().find(|c| self.schema.column(c).is_none()) {
            Some(column) => Err(Error::ColumnNotFound {
                table: table.to_string(),
                column: column.clone(),
            }),
            None => Ok(()),
        }
    }

    fn primary_keys(&self, table: &str) -> Result<&[ColumnName]> {
        if self.schema.primary_keys.is_empty() {
            return Err(Error::MissingPrimaryKey(table.to_string()));
        }
        Ok(&self.schema.primary_keys)
    }
}

/// Staged changes to one table's rows.
///
/// Rows are only replaced on [`commit`](Transaction::commit); dropping an
/// uncommitted transaction discards the staged rows.
pub struct Transaction<'a> {
    table_name: &'a str,
    table: &'a mut StoredTable,
    staged: Vec<Record>,
    committed: bool,
}

impl<'a> Transaction<'a> {
    /// Begin a transaction on a table.
    pub fn begin(table_name: &'a str, table: &'a mut StoredTable) -> Self {
        let staged = table.records.clone();
        Self {
            table_name,
            table,
            staged,
            committed: false,
        }
    }

    /// Rows as they will be after commit.
    pub fn rows_mut(&mut self) -> &mut Vec<Record> {
        &mut self.staged
    }

    /// Replace the table's rows with the staged ones.
    pub fn commit(mut self) {
        self.table.records = std::mem::take(&mut self.staged);
        self.committed = true;
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            tracing::debug!(table = self.table_name, "transaction rolled back");
        }
    }
}

/// In-memory backing store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    tables: BTreeMap<TableName, StoredTable>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table.
    pub fn create_table(&mut self, name: impl Into<TableName>, schema: TableSchema) -> Result<()> {
        let name = name.into();
        if self.tables.contains_key(&name) {
            return Err(Error::TableExists(name));
        }
        self.tables.insert(name, StoredTable::new(schema));
        Ok(())
    }

    /// Builder-style method to add a table with rows.
    pub fn with_table(
        mut self,
        name: impl Into<TableName>,
        schema: TableSchema,
        records: Vec<Record>,
    ) -> Result<Self> {
        let name = name.into();
        self.create_table(name.clone(), schema)?;
        self.insert_records(&name, &records)?;
        Ok(self)
    }

    /// Get a table by name.
    pub fn table(&self, name: &str) -> Option<&StoredTable> {
        self.tables.get(name)
    }

    /// Names of all tables.
    pub fn table_names(&self) -> impl Iterator<Item = &TableName> {
        self.tables.keys()
    }

    /// Export one table as a snapshot.
    pub fn export(&self, name: &str) -> Result<TableSnapshot> {
        let table = self.get(name)?;
        Ok(TableSnapshot::new(
            name,
            table.schema.clone(),
            table.records.clone(),
        ))
    }

    /// Import a snapshot, replacing any table with the same name.
    pub fn import(&mut self, snapshot: TableSnapshot) {
        self.tables.insert(
            snapshot.name,
            StoredTable {
                schema: snapshot.schema,
                records: snapshot.records,
            },
        );
    }

    fn get(&self, name: &str) -> Result<&StoredTable> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut StoredTable> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }
}

impl Store for MemoryStore {
    fn get_table_schema(&self, table: &str) -> Result<TableSchema> {
        Ok(self.get(table)?.schema.clone())
    }

    fn get_all_records(&self, table: &str) -> Result<Vec<Record>> {
        Ok(self.get(table)?.records.clone())
    }

    fn rename_table(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Ok(());
        }
        if self.tables.contains_key(to) {
            return Err(Error::TableExists(to.to_string()));
        }
        let table = self
            .tables
            .remove(from)
            .ok_or_else(|| Error::TableNotFound(from.to_string()))?;
        self.tables.insert(to.to_string(), table);
        Ok(())
    }

    fn drop_column(&mut self, table: &str, column: &str) -> Result<()> {
        let stored = self.get_mut(table)?;
        let Some(index) = stored.schema.columns.iter().position(|c| c.name == column) else {
            return Err(Error::ColumnNotFound {
                table: table.to_string(),
                column: column.to_string(),
            });
        };
        stored.schema.columns.remove(index);
        stored.schema.primary_keys.retain(|k| k != column);
        for record in &mut stored.records {
            record.remove(column);
        }
        Ok(())
    }

    fn add_column(&mut self, table: &str, column: &str, column_type: ColumnType) -> Result<()> {
        let stored = self.get_mut(table)?;
        if stored.schema.column(column).is_some() {
            return Err(Error::ColumnExists {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
        stored.schema.columns.push(ColumnDef::new(column, column_type));
        for record in &mut stored.records {
            record.insert(column, crate::Value::Null);
        }
        Ok(())
    }

    fn insert_records(&mut self, table: &str, records: &[Record]) -> Result<()> {
        let stored = self.get_mut(table)?;
        let columns = stored.schema.column_names();

        // Validate the whole batch before touching any row
        let mut seen = HashSet::new();
        if !stored.schema.primary_keys.is_empty() {
            for existing in &stored.records {
                seen.insert(existing.key_tuple(&stored.schema.primary_keys)?);
            }
        }
        for record in records {
            stored.check_columns(table, record)?;
            if stored.schema.primary_keys.is_empty() {
                continue;
            }
            let key = record.key_tuple(&stored.schema.primary_keys)?;
            if !seen.insert(key.clone()) {
                return Err(Error::DuplicatePrimaryKey {
                    table: table.to_string(),
                    key: key.to_string(),
                });
            }
        }

        stored
            .records
            .extend(records.iter().map(|r| r.conform(&columns)));
        Ok(())
    }

    fn update_records(&mut self, table: &str, records: &[Record]) -> Result<()> {
        let stored = self.get_mut(table)?;
        let primary_keys = stored.primary_keys(table)?.to_vec();

        let mut updates = BTreeMap::new();
        for record in records {
            stored.check_columns(table, record)?;
            updates.insert(record.key_tuple(&primary_keys)?, record);
        }

        for row in &mut stored.records {
            let key = row.key_tuple(&primary_keys)?;
            if let Some(update) = updates.get(&key) {
                for (column, value) in update.iter() {
                    row.insert(column.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    fn delete_records_by_key_values(&mut self, table: &str, keys: &[Record]) -> Result<()> {
        let stored = self.get_mut(table)?;
        let schema = stored.schema.clone();

        let mut tx = Transaction::begin(table, stored);
        for key in keys {
            if let Some(column) = key.columns().find(|c| schema.column(c).is_none()) {
                return Err(Error::ColumnNotFound {
                    table: table.to_string(),
                    column: column.clone(),
                });
            }
            tx.rows_mut()
                .retain(|row| !key.iter().all(|(c, v)| row.get(c) == Some(v)));
        }
        tx.commit();
        Ok(())
    }

    fn alter_column_types(&mut self, table: &str, mismatches: &[TypeMismatch]) -> Result<()> {
        let stored = self.get_mut(table)?;
        for mismatch in mismatches {
            match stored
                .schema
                .columns
                .iter_mut()
                .find(|c| c.name == mismatch.column)
            {
                Some(column) => column.column_type = mismatch.inferred,
                None => {
                    return Err(Error::ColumnNotFound {
                        table: table.to_string(),
                        column: mismatch.column.clone(),
                    })
                }
            }
        }
        Ok(())
    }

    fn replace_primary_key(
        &mut self,
        table: &str,
        _old: &[ColumnName],
        new: &[ColumnName],
    ) -> Result<()> {
        let stored = self.get_mut(table)?;
        if new.is_empty() {
            return Err(Error::MissingPrimaryKey(table.to_string()));
        }
        if let Some(column) = new.iter().find(|c| stored.schema.column(c).is_none()) {
            return Err(Error::ColumnNotFound {
                table: table.to_string(),
                column: column.clone(),
            });
        }

        let mut seen = HashSet::new();
        for record in &stored.records {
            let key = record.key_tuple(new)?;
            if !seen.insert(key.clone()) {
                return Err(Error::DuplicatePrimaryKey {
                    table: table.to_string(),
                    key: key.to_string(),
                });
            }
        }

        stored.schema.primary_keys = new.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{record, Value};

    fn users_schema() -> TableSchema {
        TableSchema::new(
            vec![
                ColumnDef::new("id", ColumnType::Integer),
                ColumnDef::new("name", ColumnType::Text),
            ],
            vec!["id".to_string()],
        )
    }

    fn users_store() -> MemoryStore {
        MemoryStore::new()
            .with_table(
                "users",
                users_schema(),
                vec![
                    record! { "id" => 1, "name" => "Alice" },
                    record! { "id" => 2, "name" => "Bob" },
                ],
            )
            .unwrap()
    }

    #[test]
    fn create_and_read_table() {
        let store = users_store();
        assert_eq!(store.get_table_schema("users").unwrap(), users_schema());
        assert_eq!(store.get_all_records("users").unwrap().len(), 2);
        assert!(matches!(
            store.get_all_records("posts"),
            Err(Error::TableNotFound(t)) if t == "posts"
        ));
    }

    #[test]
    fn create_existing_table_fails() {
        let mut store = users_store();
        assert!(matches!(
            store.create_table("users", users_schema()),
            Err(Error::TableExists(_))
        ));
    }

    #[test]
    fn rename_table() {
        let mut store = users_store();
        store.rename_table("users", "people").unwrap();
        assert!(store.table("users").is_none());
        assert_eq!(store.get_all_records("people").unwrap().len(), 2);
        assert!(store.rename_table("users", "x").is_err());
    }

    #[test]
    fn drop_and_add_columns() {
        let mut store = users_store();
        store.drop_column("users", "name").unwrap();
        store.add_column("users", "age", ColumnType::Integer).unwrap();

        let schema = store.get_table_schema("users").unwrap();
        assert_eq!(schema.column_names(), vec!["id", "age"]);
        assert_eq!(
            store.get_all_records("users").unwrap()[0],
            record! { "id" => 1, "age" => Value::Null }
        );

        assert!(matches!(
            store.drop_column("users", "name"),
            Err(Error::ColumnNotFound { .. })
        ));
        assert!(matches!(
            store.add_column("users", "age", ColumnType::Text),
            Err(Error::ColumnExists { .. })
        ));
    }

    #[test]
    fn insert_fills_missing_columns() {
        let mut store = users_store();
        store.insert_records("users", &[record! { "id" => 3 }]).unwrap();
        assert_eq!(
            store.get_all_records("users").unwrap()[2],
            record! { "id" => 3, "name" => Value::Null }
        );
    }

    #[test]
    fn insert_rejects_duplicate_primary_key() {
        let mut store = users_store();
        let err = store
            .insert_records(
                "users",
                &[record! { "id" => 3 }, record! { "id" => 1, "name" => "Again" }],
            )
            .unwrap_err();
        assert!(matches!(err, Error::DuplicatePrimaryKey { .. }));
        // Nothing from the batch was written
        assert_eq!(store.get_all_records("users").unwrap().len(), 2);
    }

    #[test]
    fn insert_rejects_unknown_column() {
        let mut store = users_store();
        let err = store
            .insert_records("users", &[record! { "id" => 3, "age" => 4 }])
            .unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { column, .. } if column == "age"));
    }

    #[test]
    fn update_by_primary_key() {
        let mut store = users_store();
        store
            .update_records(
                "users",
                &[
                    record! { "id" => 2, "name" => "Robert" },
                    record! { "id" => 9, "name" => "Nobody" },
                ],
            )
            .unwrap();
        let records = store.get_all_records("users").unwrap();
        assert_eq!(records[1], record! { "id" => 2, "name" => "Robert" });
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn update_without_primary_key_fails() {
        let mut store = MemoryStore::new();
        store
            .create_table(
                "log",
                TableSchema::new(vec![ColumnDef::new("msg", ColumnType::Text)], vec![]),
            )
            .unwrap();
        assert!(matches!(
            store.update_records("log", &[record! { "msg" => "x" }]),
            Err(Error::MissingPrimaryKey(_))
        ));
    }

    #[test]
    fn delete_by_key_values() {
        let mut store = users_store();
        store
            .delete_records_by_key_values("users", &[record! { "id" => 1 }])
            .unwrap();
        assert_eq!(
            store.get_all_records("users").unwrap(),
            vec![record! { "id" => 2, "name" => "Bob" }]
        );
    }

    #[test]
    fn delete_batch_is_atomic() {
        let mut store = users_store();
        let err = store
            .delete_records_by_key_values(
                "users",
                &[record! { "id" => 1 }, record! { "nope" => 2 }],
            )
            .unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { .. }));
        // The first delete was rolled back with the batch
        assert_eq!(store.get_all_records("users").unwrap().len(), 2);
    }

    #[test]
    fn alter_column_types_updates_schema() {
        let mut store = users_store();
        store
            .alter_column_types(
                "users",
                &[TypeMismatch {
                    column: "name".into(),
                    stored: ColumnType::Text,
                    inferred: ColumnType::Integer,
                }],
            )
            .unwrap();
        assert_eq!(
            store.get_table_schema("users").unwrap().column_type("name"),
            Some(ColumnType::Integer)
        );
    }

    #[test]
    fn replace_primary_key_checks_uniqueness() {
        let mut store = users_store();
        store
            .insert_records("users", &[record! { "id" => 3, "name" => "Bob" }])
            .unwrap();

        let old = vec!["id".to_string()];
        let err = store
            .replace_primary_key("users", &old, &["name".to_string()])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicatePrimaryKey { .. }));

        let composite = vec!["id".to_string(), "name".to_string()];
        store.replace_primary_key("users", &old, &composite).unwrap();
        assert_eq!(store.get_table_schema("users").unwrap().primary_keys, composite);
    }

    #[test]
    fn export_import_roundtrip() {
        let store = users_store();
        let snapshot = store.export("users").unwrap();

        let mut other = MemoryStore::new();
        other.import(snapshot);
        assert_eq!(other, store);
    }

    #[test]
    fn store_through_mutable_reference() {
        fn add(mut store: impl Store) {
            store.add_column("users", "age", ColumnType::Integer).unwrap();
        }

        let mut store = users_store();
        add(&mut store);
        assert!(store.get_table_schema("users").unwrap().column("age").is_some());
    }
}
