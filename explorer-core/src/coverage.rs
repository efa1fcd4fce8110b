//! A per-tag ledger of closed, non-overlapping intervals that have already
//! been fetched from upstream, plus gap computation against a requested
//! range.
//!
//! Generalizes the merge-on-overlap, no-merge-on-adjacency interval
//! structure this system needs: intervals that overlap are coalesced into
//! one, but merely-adjacent intervals (`c == b + 1`) are kept distinct,
//! since upstream's inclusive endpoints make adjacency structurally
//! meaningful rather than a fragmentation artifact.

use std::collections::HashMap;

/// A closed interval `[start_sec, end_sec]` in upstream's native unit
/// (whole seconds). Constructible only through [`Interval::new`], which
/// discards empty or inverted ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval {
    pub start_sec: i64,
    pub end_sec: i64,
}

impl Interval {
    /// Returns `None` if `start_sec >= end_sec`.
    pub fn new(start_sec: i64, end_sec: i64) -> Option<Self> {
        if start_sec < end_sec {
            Some(Self { start_sec, end_sec })
        } else {
            None
        }
    }

    fn overlaps_or_touches(&self, other: &Interval) -> bool {
        other.start_sec <= self.end_sec
    }
}

/// Sorts and merges overlapping intervals into canonical, pairwise
/// non-overlapping, ascending-by-start form. Merely adjacent intervals
/// (`other.start == self.end`) are *not* coalesced.
pub fn union(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_by_key(|i| i.start_sec);
    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for ivl in intervals {
        match merged.last_mut() {
            Some(last) if last.overlaps_or_touches(&ivl) => {
                last.end_sec = last.end_sec.max(ivl.end_sec);
            }
            _ => merged.push(ivl),
        }
    }
    merged
}

/// Per-tag set of disjoint, ascending covered intervals.
#[derive(Debug, Default, Clone)]
pub struct CoverageLedger {
    by_tag: HashMap<String, Vec<Interval>>,
}

impl CoverageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical covered intervals for `tag`, or an empty slice
    /// if the tag has never been recorded.
    pub fn intervals(&self, tag: &str) -> &[Interval] {
        self.by_tag.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.by_tag.keys().map(String::as_str)
    }

    /// Records a newly-fetched interval for `tag` and re-unions its
    /// coverage. A re-record of an already-covered interval is a no-op with
    /// respect to the union result.
    pub fn record(&mut self, tag: &str, interval: Interval) {
        let entry = self.by_tag.entry(tag.to_string()).or_default();
        entry.push(interval);
        let merged = union(std::mem::take(entry));
        *self.by_tag.entry(tag.to_string()).or_default() = merged;
    }

    pub fn drop(&mut self, tag: &str) {
        self.by_tag.remove(tag);
    }

    /// Computes the sub-intervals of `(start_sec, end_sec)` not yet covered
    /// for `tag`. Returns an empty list for an empty or inverted request.
    pub fn gaps(&self, tag: &str, start_sec: i64, end_sec: i64) -> Vec<Interval> {
        if start_sec >= end_sec {
            return Vec::new();
        }
        let covered = self.intervals(tag);
        let mut gaps = Vec::new();
        let mut cursor = start_sec;
        for cv in covered {
            if cv.start_sec > end_sec {
                break;
            }
            if !(cv.start_sec <= end_sec && cv.end_sec >= cursor) {
                continue;
            }
            if cv.start_sec > cursor {
                if let Some(gap) = Interval::new(cursor, cv.start_sec.min(end_sec)) {
                    gaps.push(gap);
                }
            }
            cursor = cursor.max(cv.end_sec);
        }
        if cursor < end_sec {
            if let Some(gap) = Interval::new(cursor, end_sec) {
                gaps.push(gap);
            }
        }
        gaps
    }
}
