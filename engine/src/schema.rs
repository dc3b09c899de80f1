//! Schema snapshots, drift detection and column type inference.

use crate::{ColumnName, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Boolean,
    Integer,
    Float,
    /// Generic fallback when no primitive type covers every value
    Text,
}

impl ColumnType {
    /// Primitive candidates in the order they are tried.
    const CANDIDATES: [ColumnType; 3] =
        [ColumnType::Boolean, ColumnType::Integer, ColumnType::Float];

    /// Infer a storage type from in-memory column values.
    ///
    /// Nulls are ignored. The first candidate matching every remaining
    /// value wins; an empty, all-null or mixed column is `Text`.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> ColumnType {
        let values: Vec<&Value> = values.into_iter().filter(|v| !v.is_null()).collect();
        if values.is_empty() {
            return ColumnType::Text;
        }

        Self::CANDIDATES
            .into_iter()
            .find(|candidate| candidate.covers(&values))
            .unwrap_or(ColumnType::Text)
    }

    fn covers(self, values: &[&Value]) -> bool {
        match self {
            ColumnType::Boolean => values.iter().all(|v| matches!(v, Value::Bool(_))),
            ColumnType::Integer => values.iter().all(|v| matches!(v, Value::Int(_))),
            // Integers widen into a float column, but only next to a real float
            ColumnType::Float => {
                values.iter().any(|v| matches!(v, Value::Float(_)))
                    && values
                        .iter()
                        .all(|v| matches!(v, Value::Float(_) | Value::Int(_)))
            }
            ColumnType::Text => values.iter().all(|v| matches!(v, Value::Text(_))),
        }
    }

    /// Check whether a single value can be stored in this type.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnType::Boolean, Value::Bool(_)) => true,
            (ColumnType::Integer, Value::Int(_)) => true,
            (ColumnType::Float, Value::Float(_) | Value::Int(_)) => true,
            (ColumnType::Text, Value::Text(_)) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Boolean => write!(f, "boolean"),
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Text => write!(f, "text"),
        }
    }
}

/// Definition of a stored column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub name: ColumnName,
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<ColumnName>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Structure of a stored table as reported by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    /// Columns in table order
    pub columns: Vec<ColumnDef>,
    /// Primary key columns in key order
    pub primary_keys: Vec<ColumnName>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnDef>, primary_keys: Vec<ColumnName>) -> Self {
        Self {
            columns,
            primary_keys,
        }
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<ColumnName> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Get a column definition by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get a column's type.
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.column(name).map(|c| c.column_type)
    }
}

/// Set-level view of a schema, used for drift and key comparisons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    pub columns: BTreeSet<ColumnName>,
    pub primary_keys: BTreeSet<ColumnName>,
}

impl SchemaSnapshot {
    pub fn new(
        columns: impl IntoIterator<Item = ColumnName>,
        primary_keys: impl IntoIterator<Item = ColumnName>,
    ) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            primary_keys: primary_keys.into_iter().collect(),
        }
    }
}

impl From<&TableSchema> for SchemaSnapshot {
    fn from(schema: &TableSchema) -> Self {
        Self::new(schema.column_names(), schema.primary_keys.iter().cloned())
    }
}

/// Column-level difference between the stored schema and the data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDrift {
    /// In the store but not in the data: to be dropped
    pub missing: Vec<ColumnName>,
    /// In the data but not in the store: to be added
    pub extra: Vec<ColumnName>,
}

impl SchemaDrift {
    /// Compare stored columns against the columns of the in-memory data.
    pub fn between<'a>(
        stored: &SchemaSnapshot,
        current: impl IntoIterator<Item = &'a ColumnName>,
    ) -> Self {
        let current: BTreeSet<&ColumnName> = current.into_iter().collect();
        let missing = stored
            .columns
            .iter()
            .filter(|c| !current.contains(c))
            .cloned()
            .collect();
        let extra = current
            .into_iter()
            .filter(|c| !stored.columns.contains(*c))
            .cloned()
            .collect();
        Self { missing, extra }
    }

    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// A column whose stored type no longer covers its in-memory values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMismatch {
    pub column: ColumnName,
    pub stored: ColumnType,
    pub inferred: ColumnType,
}

impl TypeMismatch {
    /// Detect a mismatch for one column present on both sides.
    ///
    /// Values that the stored type still accepts are not a mismatch, even
    /// if inference alone would pick a narrower type. Neither is a mixed
    /// column already stored as text.
    pub fn detect<'a>(
        column: &str,
        stored: ColumnType,
        values: impl IntoIterator<Item = &'a Value> + Clone,
    ) -> Option<TypeMismatch> {
        if values.clone().into_iter().all(|v| stored.accepts(v)) {
            return None;
        }
        let inferred = ColumnType::infer(values);
        (inferred != stored).then(|| TypeMismatch {
            column: column.to_string(),
            stored,
            inferred,
        })
    }
}
