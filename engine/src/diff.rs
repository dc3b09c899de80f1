//! Record diffing between two versions of a keyed record collection.
//!
//! Given an old and a new snapshot of the same records and the columns
//! that identify a record, this module classifies every key into insert,
//! update, delete or unchanged.
//!
//! # Algorithm
//!
//! 1. Index both collections by key tuple (last occurrence wins)
//! 2. Keys only in new are inserts, keys only in old are deletes
//! 3. Keys on both sides whose records differ field-for-field are updates
//!
//! A record whose key changed is a delete of the old key plus an insert of
//! the new one, never an update.
//!
//! Output order follows the input: inserts and updates in the order of
//! `new`, deletes in the order of `old`. Callers should still treat the
//! lists as sets.
//!
//! [`PagedDiffer`] computes the same result when neither collection fits in
//! memory, holding one page of keys at a time.

use crate::{error::Result, ColumnName, Error, KeyTuple, Record};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The insert/update/delete classification of two record collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Records from `new` whose key is absent from `old`
    pub insert: Vec<Record>,
    /// Records from `new` whose key exists in `old` with different fields
    pub update: Vec<Record>,
    /// Records from `old` whose key is absent from `new`
    pub delete: Vec<Record>,
}

impl ChangeSet {
    /// Returns true if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.insert.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    /// Total number of changed records.
    pub fn len(&self) -> usize {
        self.insert.len() + self.update.len() + self.delete.len()
    }
}

/// Which input collection a warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Old,
    New,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Old => write!(f, "old"),
            Side::New => write!(f, "new"),
        }
    }
}

/// Non-fatal problem found while diffing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ConsistencyWarning {
    /// A key tuple occurred more than once in one collection; the last
    /// occurrence was used.
    DuplicateKey {
        side: Side,
        key: KeyTuple,
        occurrences: usize,
    },
}

/// Change set plus the warnings raised while computing it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOutcome {
    pub changes: ChangeSet,
    pub warnings: Vec<ConsistencyWarning>,
}

impl DiffOutcome {
    /// Emit every warning as a `tracing` event.
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            match warning {
                ConsistencyWarning::DuplicateKey {
                    side,
                    key,
                    occurrences,
                } => tracing::warn!(
                    %side,
                    %key,
                    occurrences,
                    "duplicate key tuple, last occurrence wins"
                ),
            }
        }
    }
}

/// Find the changes between `old` and `new`, keyed by `key_columns`.
///
/// Duplicate keys are logged as warnings. Fails if any record lacks a key
/// column.
///
/// ```rust
/// use tabsync_engine::{record, records_changes};
///
/// let old = vec![record! { "id" => 1, "x" => 10 }, record! { "id" => 2, "x" => 20 }];
/// let new = vec![record! { "id" => 2, "x" => 21 }, record! { "id" => 3, "x" => 30 }];
///
/// let changes = records_changes(&old, &new, &["id"]).unwrap();
/// assert_eq!(changes.insert, vec![record! { "id" => 3, "x" => 30 }]);
/// assert_eq!(changes.update, vec![record! { "id" => 2, "x" => 21 }]);
/// assert_eq!(changes.delete, vec![record! { "id" => 1, "x" => 10 }]);
/// ```
pub fn records_changes<S: AsRef<str>>(
    old: &[Record],
    new: &[Record],
    key_columns: &[S],
) -> Result<ChangeSet> {
    let outcome = Differ::new(key_columns.iter().map(|c| c.as_ref().to_string())).diff(old, new)?;
    outcome.log_warnings();
    Ok(outcome.changes)
}

/// In-memory record differ.
#[derive(Debug, Clone)]
pub struct Differ {
    key_columns: Vec<ColumnName>,
}

impl Differ {
    /// Create a differ for the given key columns.
    pub fn new(key_columns: impl IntoIterator<Item = impl Into<ColumnName>>) -> Self {
        Self {
            key_columns: key_columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn key_columns(&self) -> &[ColumnName] {
        &self.key_columns
    }

    /// Diff two collections held in memory.
    pub fn diff(&self, old: &[Record], new: &[Record]) -> Result<DiffOutcome> {
        let old_index = RecordIndex::build(old, &self.key_columns)?;
        let new_index = RecordIndex::build(new, &self.key_columns)?;

        let mut changes = ChangeSet::default();

        for (position, record) in new.iter().enumerate() {
            let key = &new_index.keys[position];
            if !new_index.is_winner(key, position) {
                continue;
            }
            match old_index.get(key) {
                None => changes.insert.push(record.clone()),
                Some(previous) if previous != record => changes.update.push(record.clone()),
                Some(_) => {}
            }
        }

        for (position, record) in old.iter().enumerate() {
            let key = &old_index.keys[position];
            if old_index.is_winner(key, position) && !new_index.contains(key) {
                changes.delete.push(record.clone());
            }
        }

        let mut warnings = old_index.warnings(Side::Old);
        warnings.extend(new_index.warnings(Side::New));

        Ok(DiffOutcome { changes, warnings })
    }
}

/// Key tuple index over a borrowed collection.
struct RecordIndex<'a> {
    records: &'a [Record],
    /// Key tuple of every record, by position
    keys: Vec<KeyTuple>,
    /// Winning (last) position per key
    positions: HashMap<KeyTuple, usize>,
    /// Occurrence counts for keys seen more than once
    duplicates: HashMap<KeyTuple, usize>,
}

impl<'a> RecordIndex<'a> {
    fn build(records: &'a [Record], key_columns: &[ColumnName]) -> Result<Self> {
        let mut keys = Vec::with_capacity(records.len());
        let mut positions = HashMap::with_capacity(records.len());
        let mut duplicates = HashMap::new();

        for (position, record) in records.iter().enumerate() {
            let key = record.key_tuple(key_columns)?;
            if positions.insert(key.clone(), position).is_some() {
                *duplicates.entry(key.clone()).or_insert(1) += 1;
            }
            keys.push(key);
        }

        Ok(Self {
            records,
            keys,
            positions,
            duplicates,
        })
    }

    fn get(&self, key: &KeyTuple) -> Option<&'a Record> {
        self.positions.get(key).map(|&p| &self.records[p])
    }

    fn contains(&self, key: &KeyTuple) -> bool {
        self.positions.contains_key(key)
    }

    fn is_winner(&self, key: &KeyTuple, position: usize) -> bool {
        self.positions.get(key) == Some(&position)
    }

    fn warnings(&self, side: Side) -> Vec<ConsistencyWarning> {
        let mut duplicates: Vec<_> = self.duplicates.iter().collect();
        duplicates.sort();
        duplicates
            .into_iter()
            .map(|(key, &occurrences)| ConsistencyWarning::DuplicateKey {
                side,
                key: key.clone(),
                occurrences,
            })
            .collect()
    }
}

/// A collection that can be streamed more than once.
///
/// Each call to [`scan`](RecordSource::scan) starts a fresh pass from the
/// first record, in the same order every time.
pub trait RecordSource {
    fn scan(&self) -> Box<dyn Iterator<Item = Record> + '_>;
}

impl RecordSource for [Record] {
    fn scan(&self) -> Box<dyn Iterator<Item = Record> + '_> {
        Box::new(self.iter().cloned())
    }
}

impl RecordSource for Vec<Record> {
    fn scan(&self) -> Box<dyn Iterator<Item = Record> + '_> {
        self.as_slice().scan()
    }
}

/// Bounded-memory record differ.
///
/// Pages through one collection while streaming the other, so the working
/// set is one page of records plus the indexes for that page. Produces the
/// same [`DiffOutcome`] as [`Differ`], in the same order.
#[derive(Debug, Clone)]
pub struct PagedDiffer {
    key_columns: Vec<ColumnName>,
    page_size: usize,
}

/// One page of a source, with the keys of its records.
struct Page {
    entries: Vec<(KeyTuple, Record)>,
    /// Keys whose winning occurrence is in this page, mapped to that entry
    winners: HashMap<KeyTuple, usize>,
    /// Total occurrences per winning key across the whole source
    occurrences: HashMap<KeyTuple, usize>,
}

impl PagedDiffer {
    /// Create a paged differ. `page_size` must be non-zero.
    pub fn new(
        key_columns: impl IntoIterator<Item = impl Into<ColumnName>>,
        page_size: usize,
    ) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidPageSize);
        }
        Ok(Self {
            key_columns: key_columns.into_iter().map(Into::into).collect(),
            page_size,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Diff two streamed collections.
    pub fn diff<O, N>(&self, old: &O, new: &N) -> Result<DiffOutcome>
    where
        O: RecordSource + ?Sized,
        N: RecordSource + ?Sized,
    {
        let mut changes = ChangeSet::default();
        let mut warnings = Vec::new();

        // Pass A: pages of new against a stream of old
        let mut start = 0;
        while let Some(page) = self.load_page(new, start)? {
            let mut not_found: HashSet<&KeyTuple> = page.winners.keys().collect();
            let mut matched: HashMap<KeyTuple, Record> = HashMap::new();

            for record in old.scan() {
                let key = record.key_tuple(&self.key_columns)?;
                if page.winners.contains_key(&key) {
                    not_found.remove(&key);
                    matched.insert(key, record);
                }
            }

            for (position, (key, record)) in page.entries.iter().enumerate() {
                if page.winners.get(key) != Some(&position) {
                    continue;
                }
                if not_found.contains(key) {
                    changes.insert.push(record.clone());
                } else if matched.get(key) != Some(record) {
                    changes.update.push(record.clone());
                }
            }

            warnings.extend(page.warnings(Side::New));
            start += page.entries.len();
        }

        // Pass B: pages of old against a stream of new
        let mut start = 0;
        while let Some(page) = self.load_page(old, start)? {
            let mut not_found: HashSet<&KeyTuple> = page.winners.keys().collect();

            for record in new.scan() {
                if not_found.is_empty() {
                    break;
                }
                let key = record.key_tuple(&self.key_columns)?;
                not_found.remove(&key);
            }

            for (position, (key, record)) in page.entries.iter().enumerate() {
                if page.winners.get(key) == Some(&position) && not_found.contains(key) {
                    changes.delete.push(record.clone());
                }
            }

            warnings.extend(page.warnings(Side::Old));
            start += page.entries.len();
        }

        warnings.sort_by(|a, b| warning_order(a).cmp(&warning_order(b)));

        Ok(DiffOutcome { changes, warnings })
    }

    /// Read the page starting at `start`, resolving which of its keys win
    /// against the rest of the source.
    fn load_page<S: RecordSource + ?Sized>(
        &self,
        source: &S,
        start: usize,
    ) -> Result<Option<Page>> {
        let entries = source
            .scan()
            .skip(start)
            .take(self.page_size)
            .map(|record| Ok((record.key_tuple(&self.key_columns)?, record)))
            .collect::<Result<Vec<_>>>()?;
        if entries.is_empty() {
            return Ok(None);
        }

        let mut winners = HashMap::with_capacity(entries.len());
        let mut occurrences: HashMap<KeyTuple, usize> = HashMap::new();
        for (position, (key, _)) in entries.iter().enumerate() {
            winners.insert(key.clone(), position);
            *occurrences.entry(key.clone()).or_default() += 1;
        }

        let end = start + entries.len();
        for (position, record) in source.scan().enumerate() {
            if (start..end).contains(&position) {
                continue;
            }
            let key = record.key_tuple(&self.key_columns)?;
            if let Some(count) = occurrences.get_mut(&key) {
                *count += 1;
                // A later occurrence outside this page supersedes ours
                if position >= end {
                    winners.remove(&key);
                }
            }
        }

        Ok(Some(Page {
            entries,
            winners,
            occurrences,
        }))
    }
}

impl Page {
    fn warnings(&self, side: Side) -> Vec<ConsistencyWarning> {
        self.winners
            .keys()
            .filter_map(|key| {
                let occurrences = self.occurrences.get(key).copied().unwrap_or(1);
                (occurrences > 1).then(|| ConsistencyWarning::DuplicateKey {
                    side,
                    key: key.clone(),
                    occurrences,
                })
            })
            .collect()
    }
}

fn warning_order(warning: &ConsistencyWarning) -> (Side, &KeyTuple) {
    match warning {
        ConsistencyWarning::DuplicateKey { side, key, .. } => (*side, key),
    }
}

/// Apply a change set to `old`: insert, then delete, then update.
///
/// Inserting a key that already exists replaces it. Deleting or updating a
/// key that does not exist is a no-op.
pub fn apply_changes<S: AsRef<str>>(
    old: &[Record],
    changes: &ChangeSet,
    key_columns: &[S],
) -> Result<Vec<Record>> {
    let key_columns: Vec<ColumnName> = key_columns.iter().map(|c| c.as_ref().to_string()).collect();

    let mut rows: Vec<Option<Record>> = Vec::with_capacity(old.len() + changes.insert.len());
    let mut positions: HashMap<KeyTuple, usize> = HashMap::new();

    let mut upsert = |rows: &mut Vec<Option<Record>>, record: &Record| -> Result<()> {
        let key = record.key_tuple(&key_columns)?;
        match positions.get(&key) {
            Some(&p) => rows[p] = Some(record.clone()),
            None => {
                positions.insert(key, rows.len());
                rows.push(Some(record.clone()));
            }
        }
        Ok(())
    };

    for record in old.iter().chain(&changes.insert) {
        upsert(&mut rows, record)?;
    }

    for record in &changes.delete {
        let key = record.key_tuple(&key_columns)?;
        if let Some(p) = positions.remove(&key) {
            rows[p] = None;
        }
    }

    for record in &changes.update {
        let key = record.key_tuple(&key_columns)?;
        if let Some(&p) = positions.get(&key) {
            rows[p] = Some(record.clone());
        }
    }

    Ok(rows.into_iter().flatten().collect())
}
