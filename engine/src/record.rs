//! Records and key tuples.

use crate::{error::Result, ColumnName, Error, Value};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Build a [`Record`] from `column => value` pairs.
///
/// ```rust
/// use tabsync_engine::{record, Value};
///
/// let r = record! { "id" => 5, "name" => "Alice" };
/// assert_eq!(r.get("id"), Some(&Value::Int(5)));
/// ```
#[macro_export]
macro_rules! record {
    () => { $crate::Record::new() };
    ($($column:expr => $value:expr),+ $(,)?) => {
        [$(($column, $crate::Value::from($value))),+]
            .into_iter()
            .collect::<$crate::Record>()
    };
}

/// One row: a mapping from column name to value.
///
/// Uses a BTreeMap so that serialisation and iteration are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<ColumnName, Value>);

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Get a field value.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Set a field value, returning the previous one.
    pub fn insert(
        &mut self,
        column: impl Into<ColumnName>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        self.0.insert(column.into(), value.into())
    }

    /// Remove a field.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    /// Check if the record has a field.
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    /// Field names in sorted order.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnName> {
        self.0.keys()
    }

    /// Iterate over `(column, value)` pairs.
    pub fn iter(&self) -> btree_map::Iter<'_, ColumnName, Value> {
        self.0.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Project onto the key columns, in key-list order.
    ///
    /// Fails if any key column is absent; a partial tuple is never produced.
    pub fn key_tuple(&self, key_columns: &[ColumnName]) -> Result<KeyTuple> {
        key_columns
            .iter()
            .map(|column| {
                self.0
                    .get(column)
                    .cloned()
                    .ok_or_else(|| Error::MissingKeyColumn {
                        column: column.clone(),
                    })
            })
            .collect::<Result<Vec<_>>>()
            .map(KeyTuple)
    }

    /// Keep only the key fields.
    pub fn project(&self, key_columns: &[ColumnName]) -> Result<Record> {
        Ok(self.key_tuple(key_columns)?.to_record(key_columns))
    }

    /// Restrict to `columns`, filling columns this record lacks with `Null`.
    pub fn conform(&self, columns: &[ColumnName]) -> Record {
        columns
            .iter()
            .map(|c| (c.clone(), self.0.get(c).cloned().unwrap_or_default()))
            .collect()
    }
}

impl<K: Into<ColumnName>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Record {
    type Item = (ColumnName, Value);
    type IntoIter = btree_map::IntoIter<ColumnName, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a ColumnName, &'a Value);
    type IntoIter = btree_map::Iter<'a, ColumnName, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The ordered projection of a record onto its key columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyTuple(pub Vec<Value>);

impl KeyTuple {
    /// Rebuild a key-only record, pairing values with `key_columns` by position.
    pub fn to_record(&self, key_columns: &[ColumnName]) -> Record {
        key_columns.iter().cloned().zip(self.0.iter().cloned()).collect()
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl std::fmt::Display for KeyTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

/// Convert a list of column names given as `&str`.
pub fn column_names<S: AsRef<str>>(names: &[S]) -> Vec<ColumnName> {
    names.iter().map(|n| n.as_ref().to_string()).collect()
}
