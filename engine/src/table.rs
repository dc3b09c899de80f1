//! In-memory tabular datasets.
//!
//! [`Table`] is the interface the reconciler needs from whatever in-memory
//! table type the application uses. [`DataTable`] is a small owned
//! implementation of it.

use crate::{ColumnName, Record, Value};
use serde::{Deserialize, Serialize};

/// An in-memory dataset that can be pushed to a store.
pub trait Table {
    /// Column names in table order.
    fn column_names(&self) -> Vec<ColumnName>;

    /// Every row as a record.
    fn records(&self) -> Vec<Record>;

    /// All values of one column, or `None` if there is no such column.
    fn column_values(&self, name: &str) -> Option<Vec<Value>>;
}

/// A row-oriented table with an ordered column list.
///
/// Every row carries exactly the table's columns; absent values are `Null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTable {
    columns: Vec<ColumnName>,
    rows: Vec<Record>,
}

impl DataTable {
    /// Create an empty table with the given columns.
    pub fn new(columns: impl IntoIterator<Item = impl Into<ColumnName>>) -> Self {
        let mut table = Self::default();
        for column in columns {
            let column = column.into();
            if !table.columns.contains(&column) {
                table.columns.push(column);
            }
        }
        table
    }

    /// Build a table from records. Columns are ordered by first appearance.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let records: Vec<Record> = records.into_iter().collect();
        let mut table = Self::new(records.iter().flat_map(|r| r.columns().cloned()));
        for record in records {
            table.push_record(record);
        }
        table
    }

    /// Append a row. Unknown fields are ignored, missing ones become `Null`.
    pub fn push_record(&mut self, record: Record) {
        self.rows.push(record.conform(&self.columns));
    }

    /// Add a column with one value per row.
    ///
    /// Extra values are ignored and missing ones become `Null`. Adding an
    /// existing column replaces its values.
    pub fn add_column(
        &mut self,
        name: impl Into<ColumnName>,
        values: impl IntoIterator<Item = Value>,
    ) {
        let name = name.into();
        if !self.columns.contains(&name) {
            self.columns.push(name.clone());
        }
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.insert(name.clone(), values.next().unwrap_or_default());
        }
    }

    /// Remove a column. Returns false if it did not exist.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(index) = self.columns.iter().position(|c| c == name) else {
            return false;
        };
        self.columns.remove(index);
        for row in &mut self.rows {
            row.remove(name);
        }
        true
    }

    /// Rename a column in place. Returns false if `from` does not exist or
    /// `to` already does.
    pub fn rename_column(&mut self, from: &str, to: impl Into<ColumnName>) -> bool {
        let to = to.into();
        if self.columns.contains(&to) {
            return false;
        }
        let Some(index) = self.columns.iter().position(|c| c == from) else {
            return false;
        };
        self.columns[index] = to.clone();
        for row in &mut self.rows {
            let value = row.remove(from).unwrap_or_default();
            row.insert(to.clone(), value);
        }
        true
    }

    /// Set one cell. Returns false if the row or column does not exist.
    pub fn set(&mut self, row: usize, column: &str, value: impl Into<Value>) -> bool {
        if !self.columns.iter().any(|c| c == column) {
            return false;
        }
        match self.rows.get_mut(row) {
            Some(record) => {
                record.insert(column, value);
                true
            }
            None => false,
        }
    }

    /// Keep only the rows matching `f`.
    pub fn retain(&mut self, f: impl FnMut(&Record) -> bool) {
        self.rows.retain(f);
    }

    /// Get a row by position.
    pub fn row(&self, index: usize) -> Option<&Record> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn columns(&self) -> &[ColumnName] {
        &self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Table for DataTable {
    fn column_names(&self) -> Vec<ColumnName> {
        self.columns.clone()
    }

    fn records(&self) -> Vec<Record> {
        self.rows.clone()
    }

    fn column_values(&self, name: &str) -> Option<Vec<Value>> {
        if !self.columns.iter().any(|c| c == name) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|row| row.get(name).cloned().unwrap_or_default())
                .collect(),
        )
    }
}

impl<T: Table + ?Sized> Table for &T {
    fn column_names(&self) -> Vec<ColumnName> {
        (**self).column_names()
    }

    fn records(&self) -> Vec<Record> {
        (**self).records()
    }

    fn column_values(&self, name: &str) -> Option<Vec<Value>> {
        (**self).column_values(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    fn sample() -> DataTable {
        DataTable::from_records(vec![
            record! { "id" => 1, "name" => "Alice" },
            record! { "id" => 2, "age" => 30 },
        ])
    }

    #[test]
    fn from_records_orders_columns_by_first_appearance() {
        let table = sample();
        assert_eq!(table.columns(), ["id", "name", "age"]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.row(0).unwrap(),
            &record! { "id" => 1, "name" => "Alice", "age" => Value::Null }
        );
    }

    #[test]
    fn column_values_by_name() {
        let table = sample();
        assert_eq!(
            table.column_values("age"),
            Some(vec![Value::Null, Value::Int(30)])
        );
        assert_eq!(table.column_values("missing"), None);
    }

    #[test]
    fn add_and_drop_columns() {
        let mut table = sample();
        table.add_column("score", vec![Value::Float(1.5)]);
        assert_eq!(
            table.column_values("score"),
            Some(vec![Value::Float(1.5), Value::Null])
        );

        assert!(table.drop_column("name"));
        assert!(!table.drop_column("name"));
        assert_eq!(table.column_names(), vec!["id", "age", "score"]);
        assert!(!table.row(0).unwrap().contains("name"));
    }

    #[test]
    fn rename_column_keeps_values() {
        let mut table = sample();
        assert!(table.rename_column("name", "full_name"));
        assert!(!table.rename_column("name", "other"));
        assert!(!table.rename_column("id", "age"));
        assert_eq!(
            table.column_values("full_name"),
            Some(vec![Value::from("Alice"), Value::Null])
        );
    }

    #[test]
    fn set_and_retain() {
        let mut table = sample();
        assert!(table.set(1, "name", "Bob"));
        assert!(!table.set(5, "name", "Eve"));
        assert!(!table.set(0, "nope", 1));

        table.retain(|r| r.get("id") != Some(&Value::Int(1)));
        assert_eq!(table.len(), 1);
        assert_eq!(table.row(0).unwrap().get("name"), Some(&Value::from("Bob")));
    }

    #[test]
    fn push_record_ignores_unknown_fields() {
        let mut table = DataTable::new(["id"]);
        table.push_record(record! { "id" => 1, "extra" => true });
        assert_eq!(table.records(), vec![record! { "id" => 1 }]);
    }
}
