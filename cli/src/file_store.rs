//! A store backed by a directory of table snapshot files.
//!
//! Each table lives in `<dir>/<table>.json` as a [`TableSnapshot`]. Every
//! mutating call loads the table, applies the change in memory and writes
//! the file back through a temporary file and a rename, so a failed call
//! leaves the previous file in place.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use tabsync_engine::error::Result;
use tabsync_engine::{
    ColumnName, ColumnType, Error, MemoryStore, Record, Store, TableSchema, TableSnapshot,
    TypeMismatch,
};

const EXTENSION: &str = "json";

/// Directory of table snapshots.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Check if a table file exists.
    pub fn contains(&self, table: &str) -> Result<bool> {
        Ok(self.path(table)?.exists())
    }

    /// Create an empty table.
    pub fn create_table(&mut self, table: &str, schema: TableSchema) -> Result<()> {
        if self.contains(table)? {
            return Err(Error::TableExists(table.to_string()));
        }
        self.save(&TableSnapshot::new(table, schema, Vec::new()))
    }

    /// Read a table's snapshot.
    pub fn load(&self, table: &str) -> Result<TableSnapshot> {
        let path = self.path(table)?;
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                return Err(Error::TableNotFound(table.to_string()))
            }
            Err(e) => return Err(io_error(&path, e)),
        };
        TableSnapshot::from_json(&json)
    }

    fn save(&self, snapshot: &TableSnapshot) -> Result<()> {
        let path = self.path(&snapshot.name)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, snapshot.to_json_pretty()?).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error(&path, e))?;
        tracing::debug!(path = %path.display(), rows = snapshot.record_count(), "wrote table");
        Ok(())
    }

    /// Run `f` against the table loaded into memory, then write it back.
    fn modify<T>(
        &mut self,
        table: &str,
        f: impl FnOnce(&mut MemoryStore) -> Result<T>,
    ) -> Result<T> {
        let mut memory = MemoryStore::new();
        memory.import(self.load(table)?);
        let out = f(&mut memory)?;
        self.save(&memory.export(table)?)?;
        Ok(out)
    }

    fn path(&self, table: &str) -> Result<PathBuf> {
        let valid = !table.is_empty()
            && !table.starts_with('.')
            && !table.contains(['/', '\\'])
            && table != "..";
        if !valid {
            return Err(Error::Store(format!("invalid table name: {table:?}")));
        }
        Ok(self.dir.join(format!("{table}.{EXTENSION}")))
    }
}

fn io_error(path: &Path, e: std::io::Error) -> Error {
    Error::Store(format!("{}: {}", path.display(), e))
}

impl Store for FileStore {
    fn get_table_schema(&self, table: &str) -> Result<TableSchema> {
        Ok(self.load(table)?.schema)
    }

    fn get_all_records(&self, table: &str) -> Result<Vec<Record>> {
        Ok(self.load(table)?.records)
    }

    fn rename_table(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Ok(());
        }
        if self.contains(to)? {
            return Err(Error::TableExists(to.to_string()));
        }
        let mut snapshot = self.load(from)?;
        snapshot.name = to.to_string();
        self.save(&snapshot)?;
        let old = self.path(from)?;
        fs::remove_file(&old).map_err(|e| io_error(&old, e))
    }

    fn drop_column(&mut self, table: &str, column: &str) -> Result<()> {
        self.modify(table, |m| m.drop_column(table, column))
    }

    fn add_column(&mut self, table: &str, column: &str, column_type: ColumnType) -> Result<()> {
        self.modify(table, |m| m.add_column(table, column, column_type))
    }

    fn insert_records(&mut self, table: &str, records: &[Record]) -> Result<()> {
        self.modify(table, |m| m.insert_records(table, records))
    }

    fn update_records(&mut self, table: &str, records: &[Record]) -> Result<()> {
        self.modify(table, |m| m.update_records(table, records))
    }

    fn delete_records_by_key_values(&mut self, table: &str, keys: &[Record]) -> Result<()> {
        self.modify(table, |m| m.delete_records_by_key_values(table, keys))
    }

    fn alter_column_types(&mut self, table: &str, mismatches: &[TypeMismatch]) -> Result<()> {
        self.modify(table, |m| m.alter_column_types(table, mismatches))
    }

    fn replace_primary_key(
        &mut self,
        table: &str,
        old: &[ColumnName],
        new: &[ColumnName],
    ) -> Result<()> {
        self.modify(table, |m| m.replace_primary_key(table, old, new))
    }
}
