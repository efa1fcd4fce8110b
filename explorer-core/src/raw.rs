//! The wide table of ingested samples, keyed by `timestamp_ms`.
//!
//! Column-major: one shared, strictly-ascending timestamp vector and one
//! `Vec<Option<f64>>` per tag, all aligned by row index. Ingest, column
//! drop, and the WORKING derivation (`crate::working`) all operate
//! column-by-column, which this layout makes O(rows) rather than
//! O(rows * tags).

use chrono::{TimeZone, Utc};
use indexmap::IndexMap;

use crate::sample::Sample;

pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// A wide table keyed by `timestamp_ms`, with one column per tag.
#[derive(Debug, Default, Clone)]
pub struct RawTable {
    timestamps_ms: Vec<i64>,
    columns: IndexMap<String, Vec<Option<f64>>>,
}

/// A sparse two-column result ready for [`RawTable::ingest`]: one tag's
/// samples, not yet merged against the shared timestamp axis.
#[derive(Debug, Clone)]
pub struct MiniTable {
    pub tag: String,
    pub samples: Vec<Sample>,
}

impl RawTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.timestamps_ms.len()
    }

    pub fn timestamps_ms(&self) -> &[i64] {
        &self.timestamps_ms
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, tag: &str) -> Option<&[Option<f64>]> {
        self.columns.get(tag).map(Vec::as_slice)
    }

    pub fn last_timestamp_ms(&self) -> Option<i64> {
        self.timestamps_ms.last().copied()
    }

    /// Derives `timestamp_text` from `timestamp_ms`, UTC, `dd/MM/yyyy
    /// HH:mm:ss`. Lazily computed rather than stored, per the arena-and-index
    /// recommendation: the text column is presentation-only.
    pub fn timestamp_text(&self) -> Vec<String> {
        self.timestamps_ms
            .iter()
            .map(|&ms| format_timestamp(ms))
            .collect()
    }

    /// Merges a single tag's samples into the table by outer-join on
    /// `timestamp_ms`. New timestamps create new rows with absent in every
    /// other column; an incoming present value overwrites an existing one,
    /// but an incoming absent value never overwrites a present one.
    pub fn ingest(&mut self, mini: MiniTable) {
        if !self.columns.contains_key(&mini.tag) {
            self.columns
                .insert(mini.tag.clone(), vec![None; self.timestamps_ms.len()]);
        }

        for sample in mini.samples {
            match self.timestamps_ms.binary_search(&sample.timestamp_ms) {
                Ok(idx) => {
                    if sample.value.is_some() {
                        self.columns[&mini.tag][idx] = sample.value;
                    }
                }
                Err(idx) => {
                    self.timestamps_ms.insert(idx, sample.timestamp_ms);
                    for (name, col) in self.columns.iter_mut() {
                        col.insert(idx, if *name == mini.tag { sample.value } else { None });
                    }
                }
            }
        }
    }

    /// Removes `tag`'s column without touching any other column or the row
    /// set.
    pub fn drop_column(&mut self, tag: &str) {
        self.columns.shift_remove(tag);
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps_ms.is_empty()
    }

    pub(crate) fn columns(&self) -> &IndexMap<String, Vec<Option<f64>>> {
        &self.columns
    }

    pub(crate) fn from_parts(
        timestamps_ms: Vec<i64>,
        columns: IndexMap<String, Vec<Option<f64>>>,
    ) -> Self {
        Self {
            timestamps_ms,
            columns,
        }
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mini(tag: &str, samples: &[(i64, Option<f64>)]) -> MiniTable {
        MiniTable {
            tag: tag.to_string(),
            samples: samples
                .iter()
                .map(|&(t, v)| Sample::new(t, v))
                .collect(),
        }
    }

    #[test]
    fn ingest_creates_ascending_unique_rows() {
        let mut raw = RawTable::new();
        raw.ingest(mini("A", &[(2000, Some(30.0)), (1000, Some(10.0)), (1500, Some(20.0))]));
        assert_eq!(raw.timestamps_ms(), &[1000, 1500, 2000]);
        assert_eq!(
            raw.column("A").unwrap(),
            &[Some(10.0), Some(20.0), Some(30.0)]
        );
    }

    #[test]
    fn second_tag_joins_with_absent_elsewhere() {
        let mut raw = RawTable::new();
        raw.ingest(mini("A", &[(1000, Some(10.0)), (1500, Some(20.0)), (2000, Some(30.0))]));
        raw.ingest(mini("B", &[(1200, Some(5.0)), (1800, Some(7.0))]));

        assert_eq!(raw.timestamps_ms(), &[1000, 1200, 1500, 1800, 2000]);
        assert_eq!(
            raw.column("A").unwrap(),
            &[Some(10.0), None, Some(20.0), None, Some(30.0)]
        );
        assert_eq!(
            raw.column("B").unwrap(),
            &[None, Some(5.0), None, Some(7.0), None]
        );
    }

    #[test]
    fn present_new_overwrites_present_old_absent_does_not() {
        let mut raw = RawTable::new();
        raw.ingest(mini("A", &[(1000, Some(1.0))]));
        raw.ingest(mini("A", &[(1000, None)]));
        assert_eq!(raw.column("A").unwrap(), &[Some(1.0)]);

        raw.ingest(mini("A", &[(1000, Some(2.0))]));
        assert_eq!(raw.column("A").unwrap(), &[Some(2.0)]);
    }

    #[test]
    fn all_absent_ingest_never_mutates_existing_column() {
        let mut raw = RawTable::new();
        raw.ingest(mini("A", &[(1000, Some(1.0)), (2000, Some(2.0))]));
        let before = raw.column("A").unwrap().to_vec();
        raw.ingest(mini("A", &[(1000, None), (2000, None)]));
        assert_eq!(raw.column("A").unwrap(), before.as_slice());
    }

    #[test]
    fn drop_column_leaves_others_and_rows_untouched() {
        let mut raw = RawTable::new();
        raw.ingest(mini("A", &[(1000, Some(1.0))]));
        raw.ingest(mini("B", &[(1000, Some(2.0))]));
        raw.drop_column("B");
        assert_eq!(raw.row_count(), 1);
        assert_eq!(raw.column("A").unwrap(), &[Some(1.0)]);
        assert!(raw.column("B").is_none());
    }

    #[test]
    fn non_finite_values_are_coerced_to_absent() {
        let mut raw = RawTable::new();
        raw.ingest(mini(
            "A",
            &[
                (1000, Sample::parse_value("inf")),
                (2000, Sample::parse_value("nan")),
                (3000, Sample::parse_value("3.5")),
            ],
        ));
        assert_eq!(raw.column("A").unwrap(), &[None, None, Some(3.5)]);
    }

    #[test]
    fn timestamp_text_matches_timestamp_ms() {
        let mut raw = RawTable::new();
        raw.ingest(mini("A", &[(0, Some(1.0))]));
        assert_eq!(raw.timestamp_text(), vec!["01/01/1970 00:00:00".to_string()]);
    }
}
