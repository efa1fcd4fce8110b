//! The change-signature gate used to decide whether RAW has moved since the
//! last WORKING build, avoiding an O(rows * tags) rebuild when it hasn't.

use crate::raw::RawTable;

/// `(row_count, sorted_column_set, last_timestamp_ms)`. Two RAW snapshots
/// with equal signatures are treated as unchanged for rebuild purposes,
/// even though this is not a full content hash — `spec.md` defines the gate
/// exactly this coarsely, trading perfect precision for an O(tags) check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSignature {
    pub row_count: usize,
    pub sorted_columns: Vec<String>,
    pub last_timestamp_ms: Option<i64>,
}

impl ChangeSignature {
    pub fn of(raw: &RawTable) -> Self {
        let mut sorted_columns: Vec<String> = raw.tag_names().map(str::to_string).collect();
        sorted_columns.sort();
        Self {
            row_count: raw.row_count(),
            sorted_columns,
            last_timestamp_ms: raw.last_timestamp_ms(),
        }
    }
}
