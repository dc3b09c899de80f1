//! Error types for the tabsync engine.

use crate::{ColumnName, TableName};
use thiserror::Error;

/// All possible errors from the tabsync engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Configuration errors
    #[error("missing key column: {column}")]
    MissingKeyColumn { column: ColumnName },

    #[error("table '{0}' has no primary key")]
    MissingPrimaryKey(TableName),

    #[error("page size must be greater than zero")]
    InvalidPageSize,

    // Store errors
    #[error("table not found: {0}")]
    TableNotFound(TableName),

    #[error("table already exists: {0}")]
    TableExists(TableName),

    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: TableName, column: ColumnName },

    #[error("column '{column}' already exists in table '{table}'")]
    ColumnExists { table: TableName, column: ColumnName },

    #[error("duplicate primary key in table '{table}': {key}")]
    DuplicatePrimaryKey { table: TableName, key: String },

    #[error("store error: {0}")]
    Store(String),

    // State errors
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller contract violation, raised before anything is mutated.
    Configuration,
    /// A storage collaborator call failed. Not retried.
    Store,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingKeyColumn { .. }
            | Error::MissingPrimaryKey(_)
            | Error::InvalidPageSize => ErrorKind::Configuration,
            _ => ErrorKind::Store,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::TableNotFound("users".into());
        assert_eq!(err.to_string(), "table not found: users");

        let err = Error::MissingKeyColumn {
            column: "id".into(),
        };
        assert_eq!(err.to_string(), "missing key column: id");

        let err = Error::ColumnNotFound {
            table: "users".into(),
            column: "age".into(),
        };
        assert_eq!(
            err.to_string(),
            "column 'age' not found in table 'users'"
        );
    }

    #[test]
    fn error_kind() {
        assert_eq!(
            Error::MissingPrimaryKey("t".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(Error::InvalidPageSize.kind(), ErrorKind::Configuration);
        assert_eq!(Error::Store("boom".into()).kind(), ErrorKind::Store);
        assert_eq!(Error::TableNotFound("t".into()).kind(), ErrorKind::Store);
    }
}
