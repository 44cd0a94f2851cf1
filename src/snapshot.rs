//! Feed snapshots and row-level change detection

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One record of the feed. Field 0 is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Row(Vec<String>);

impl Row {
    pub fn new(fields: Vec<String>) -> Self {
        Self(fields)
    }

    /// Identity key; empty when the row has no fields at all
    pub fn key(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("")
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// A blank record, e.g. from a trailing separator
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(String::is_empty)
    }
}

impl<S: Into<String>> FromIterator<S> for Row {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Rows parsed from a single fetch, in feed order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    rows: Vec<Row>,
}

impl Snapshot {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index rows by identity key, keeping the first occurrence of each key
    pub fn key_index(&self) -> IndexMap<&str, &Row> {
        let mut index = IndexMap::with_capacity(self.rows.len());
        for row in &self.rows {
            index.entry(row.key()).or_insert(row);
        }
        index
    }

    /// Keys appearing on more than one row, with their occurrence count
    pub fn duplicate_keys(&self) -> Vec<(&str, usize)> {
        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for row in &self.rows {
            match counts.entry(row.key()) {
                Entry::Occupied(mut e) => *e.get_mut() += 1,
                Entry::Vacant(e) => {
                    e.insert(1);
                }
            }
        }
        counts.into_iter().filter(|(_, n)| *n > 1).collect()
    }
}

impl FromIterator<Row> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A new or changed row paired with its prior version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntry {
    pub previous: Option<Row>,
    pub current: Row,
}

impl DiffEntry {
    pub fn is_new(&self) -> bool {
        self.previous.is_none()
    }
}

/// Rows of `current` that do not appear verbatim in `previous`.
///
/// Each entry carries the first row of `previous` sharing its key, if any.
/// Removed rows are never reported, and output follows `current`'s order.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> Vec<DiffEntry> {
    let unchanged: HashSet<&Row> = previous.rows().iter().collect();
    let by_key = previous.key_index();

    current
        .rows()
        .iter()
        .filter(|row| !unchanged.contains(row))
        .map(|row| DiffEntry {
            previous: by_key.get(row.key()).map(|p| (*p).clone()),
            current: row.clone(),
        })
        .collect()
}

/// The most recently accepted snapshot, owned by the poll loop
#[derive(Debug, Clone, Default)]
pub enum SnapshotCell {
    #[default]
    Empty,
    Populated(Snapshot),
}

impl SnapshotCell {
    pub fn get(&self) -> Option<&Snapshot> {
        match self {
            Self::Empty => None,
            Self::Populated(snapshot) => Some(snapshot),
        }
    }

    pub fn is_populated(&self) -> bool {
        matches!(self, Self::Populated(_))
    }

    /// Store `snapshot`, returning whatever was held before
    pub fn replace(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        match std::mem::replace(self, Self::Populated(snapshot)) {
            Self::Empty => None,
            Self::Populated(old) => Some(old),
        }
    }
}
