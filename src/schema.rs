//! Named field positions for feed rows

use crate::error::{Result, WatchError};
use crate::snapshot::{Row, Snapshot};
use serde::Serialize;

/// Location of a field within a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Position {
    /// Zero-based offset from the first field
    Index(usize),
    /// Offset from the end; `FromEnd(1)` is the last field
    FromEnd(usize),
}

impl Position {
    pub fn resolve(self, len: usize) -> Option<usize> {
        match self {
            Self::Index(i) if i < len => Some(i),
            Self::FromEnd(n) if n >= 1 && n <= len => Some(len - n),
            _ => None,
        }
    }

    pub fn get(self, row: &Row) -> Option<&str> {
        self.resolve(row.len()).and_then(|i| row.get(i))
    }
}

/// A numeric column whose before/after values are announced on change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedColumn {
    pub name: &'static str,
    pub position: Position,
}

/// Mapping from field names to positions for one feed format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowLayout {
    pub name: &'static str,
    pub key: Position,
    /// Value shown for a newly listed row
    pub summary: Position,
    /// Human-readable course label shown for a changed row
    pub label: Position,
    pub tracked: Vec<TrackedColumn>,
}

impl RowLayout {
    /// Current feed: enrolment counters sit at the end of each row
    pub fn current() -> Self {
        Self {
            name: "current",
            key: Position::Index(0),
            summary: Position::Index(1),
            label: Position::Index(2),
            tracked: vec![
                TrackedColumn {
                    name: "enrolled",
                    position: Position::FromEnd(2),
                },
                TrackedColumn {
                    name: "vacancies",
                    position: Position::FromEnd(1),
                },
            ],
        }
    }

    /// Older feed with a single registration count in column 6
    pub fn legacy() -> Self {
        Self {
            name: "legacy",
            key: Position::Index(0),
            summary: Position::Index(1),
            label: Position::Index(2),
            tracked: vec![TrackedColumn {
                name: "registered",
                position: Position::Index(6),
            }],
        }
    }

    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "current" => Ok(Self::current()),
            "legacy" => Ok(Self::legacy()),
            _ => Err(format!("Invalid row layout: {}. Use 'current' or 'legacy'", s)),
        }
    }

    fn named_positions(&self) -> impl Iterator<Item = (&'static str, Position)> + '_ {
        [("key", self.key), ("summary", self.summary), ("label", self.label)]
            .into_iter()
            .chain(self.tracked.iter().map(|t| (t.name, t.position)))
    }

    /// Names of the fields `row` is too short to provide
    pub fn missing_fields(&self, row: &Row) -> Vec<&'static str> {
        self.named_positions()
            .filter(|(_, pos)| pos.resolve(row.len()).is_none())
            .map(|(name, _)| name)
            .collect()
    }

    /// Check every non-blank row of `snapshot` against this layout
    pub fn validate(&self, snapshot: &Snapshot) -> SchemaReport {
        let violations = snapshot
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.is_blank())
            .filter_map(|(row_index, row)| {
                let missing = self.missing_fields(row);
                if missing.is_empty() {
                    None
                } else {
                    Some(SchemaViolation {
                        row_index,
                        key: row.key().to_string(),
                        field_count: row.len(),
                        missing,
                    })
                }
            })
            .collect();

        SchemaReport {
            layout: self.name,
            violations,
        }
    }
}

impl Default for RowLayout {
    fn default() -> Self {
        Self::current()
    }
}

/// A row lacking one or more named fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    pub row_index: usize,
    pub key: String,
    pub field_count: usize,
    pub missing: Vec<&'static str>,
}

/// Outcome of validating a snapshot against a layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    pub layout: &'static str,
    pub violations: Vec<SchemaViolation>,
}

impl SchemaReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(WatchError::Schema {
                layout: self.layout.to_string(),
                violations: self.violations.len(),
            })
        }
    }
}
