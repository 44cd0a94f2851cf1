//! Delimited-text parsing for feed payloads

use crate::snapshot::{Row, Snapshot};
use serde::{Deserialize, Serialize};

/// Record and field separators used to split a payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    pub record: String,
    pub field: String,
}

impl Delimiters {
    /// Literal `\n` / `\t` escape sequences, as served by the registration feed
    pub fn escaped() -> Self {
        Self {
            record: "\\n".to_string(),
            field: "\\t".to_string(),
        }
    }

    /// Real newline and tab characters
    pub fn tsv() -> Self {
        Self {
            record: "\n".to_string(),
            field: "\t".to_string(),
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "escaped" => Ok(Self::escaped()),
            "tsv" => Ok(Self::tsv()),
            _ => Err(format!("Invalid delimiters: {}. Use 'escaped' or 'tsv'", s)),
        }
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::escaped()
    }
}

/// A fetched payload split into its stamp line and data rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPayload {
    /// First record of the payload, the feed's generation timestamp
    pub stamp: String,
    pub snapshot: Snapshot,
}

/// Split `payload` into rows of fields.
///
/// Every record becomes a row, including the header line and any trailing
/// empty record. Rows are never padded or truncated.
pub fn parse(payload: &str, delimiters: &Delimiters) -> Snapshot {
    let rows = payload
        .split(delimiters.record.as_str())
        .map(|line| Row::new(line.split(delimiters.field.as_str()).map(str::to_string).collect()))
        .collect();
    Snapshot::new(rows)
}

/// Parse a feed payload and drop its leading timestamp record
pub fn parse_feed(payload: &str, delimiters: &Delimiters) -> FeedPayload {
    let (stamp, body) = match payload.split_once(delimiters.record.as_str()) {
        Some((stamp, body)) => (stamp.to_string(), Some(body)),
        None => (payload.to_string(), None),
    };

    let snapshot = match body {
        Some(body) => parse(body, delimiters),
        None => Snapshot::default(),
    };

    FeedPayload { stamp, snapshot }
}
